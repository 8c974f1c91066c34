use async_trait::async_trait;
use fitreg_model::{
    account::{AccountId, NewAccount},
    profile::Profile,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("server unreachable")]
    CommunicationError,
    #[error("internal server error")]
    InternalServerError,
    #[error("invalid request")]
    RequestError,
    #[error("incorrect server response")]
    ResponseError,
}

type Result<T> = std::result::Result<T, Error>;

#[mockall::automock]
#[async_trait]
pub trait Client: Send + Sync {
    async fn register_account(&self, account: &NewAccount) -> Result<AccountId>;
    async fn login(&self, email: &str, password: &str) -> Result<String>;
    async fn latest_profile(&self, email: &str) -> Result<Profile>;
    async fn export_csv(&self) -> Result<Vec<u8>>;
}

pub struct ClientImpl {
    url: String,
    client: reqwest::Client,
}

impl ClientImpl {
    fn new(url: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }

    async fn send(request: RequestBuilder) -> Result<Response> {
        let resp = request
            .send()
            .await
            .map_err(|_| Error::CommunicationError)?;
        check_status(resp.status())?;
        Ok(resp)
    }
}

pub fn create(url: String) -> impl Client {
    ClientImpl::new(url)
}

fn check_status(status: StatusCode) -> Result<()> {
    if status.is_client_error() {
        Err(Error::RequestError)
    } else if status.is_server_error() {
        Err(Error::InternalServerError)
    } else {
        Ok(())
    }
}

#[derive(Deserialize)]
struct Registered {
    account_id: AccountId,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct Session {
    token: String,
}

#[async_trait]
impl Client for ClientImpl {
    async fn register_account(&self, account: &NewAccount) -> Result<AccountId> {
        Self::send(self.client.post(self.endpoint("/accounts")).json(account))
            .await?
            .json::<Registered>()
            .await
            .map(|r| r.account_id)
            .map_err(|_| Error::ResponseError)
    }

    async fn login(&self, email: &str, password: &str) -> Result<String> {
        Self::send(
            self.client
                .post(self.endpoint("/sessions"))
                .json(&Credentials { email, password }),
        )
        .await?
        .json::<Session>()
        .await
        .map(|s| s.token)
        .map_err(|_| Error::ResponseError)
    }

    async fn latest_profile(&self, email: &str) -> Result<Profile> {
        Self::send(
            self.client
                .get(self.endpoint("/profiles/latest"))
                .query(&[("email", email)]),
        )
        .await?
        .json()
        .await
        .map_err(|_| Error::ResponseError)
    }

    async fn export_csv(&self) -> Result<Vec<u8>> {
        Self::send(self.client.get(self.endpoint("/profiles/export")))
            .await?
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|_| Error::ResponseError)
    }
}

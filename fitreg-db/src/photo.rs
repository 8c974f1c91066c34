use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use fitreg_model::photo::{NewPhoto, Photo, PhotoFormat};
use log::{debug, info};
use tokio::fs;
use uuid::Uuid;

use crate::{connection::Connection, Error, Result};

#[mockall::automock]
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Persists the photo and returns the key it can be fetched with.
    async fn store(&self, photo: NewPhoto) -> Result<String>;
    async fn fetch(&self, key: &str) -> Result<Option<Photo>>;
    /// Removes the photo. Unknown keys are ignored.
    async fn delete(&self, key: &str) -> Result<()>;
}

fn new_key(format: PhotoFormat) -> String {
    format!("{}.{}", Uuid::new_v4(), format.extension())
}

/// Splits a key produced by [`new_key`]. Anything else is rejected, so a key
/// can never address a file outside the store.
fn parse_key(key: &str) -> Option<(Uuid, PhotoFormat)> {
    let (id, extension) = key.split_once('.')?;
    Some((
        Uuid::parse_str(id).ok()?,
        PhotoFormat::from_extension(extension)?,
    ))
}

/// Keeps every photo as a file named after its key.
pub struct DirectoryPhotoStore {
    directory: PathBuf,
}

impl DirectoryPhotoStore {
    pub async fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory).await?;
        info!("Storing photos in {}", directory.display());
        Ok(Self { directory })
    }
}

#[async_trait]
impl PhotoStore for DirectoryPhotoStore {
    async fn store(&self, photo: NewPhoto) -> Result<String> {
        let key = new_key(photo.format);
        debug!(
            "Writing photo {:?} as {} ({} bytes)",
            photo.file_name,
            key,
            photo.data.len()
        );
        fs::write(self.directory.join(&key), &photo.data).await?;
        Ok(key)
    }

    async fn fetch(&self, key: &str) -> Result<Option<Photo>> {
        let Some((_, format)) = parse_key(key) else {
            return Ok(None);
        };

        match fs::read(self.directory.join(key)).await {
            Ok(data) => Ok(Some(Photo {
                key: key.to_owned(),
                format,
                data,
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if parse_key(key).is_none() {
            return Ok(());
        }

        debug!("Removing photo {}", key);
        match fs::remove_file(self.directory.join(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps photos as blobs next to the profiles they belong to.
pub struct SqlitePhotoStore {
    connection: Connection,
}

impl SqlitePhotoStore {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PhotoStore for SqlitePhotoStore {
    async fn store(&self, photo: NewPhoto) -> Result<String> {
        let key = new_key(photo.format);
        let mut conn = self.connection.lock().await;
        debug!("Storing photo blob {} ({} bytes)", key, photo.data.len());
        sqlx::query("INSERT INTO photos (key, file_name, content_type, data) VALUES (?, ?, ?, ?)")
            .bind(&key)
            .bind(&photo.file_name)
            .bind(photo.format.content_type())
            .bind(&photo.data)
            .execute(&mut *conn)
            .await?;
        Ok(key)
    }

    async fn fetch(&self, key: &str) -> Result<Option<Photo>> {
        let mut conn = self.connection.lock().await;
        let row: Option<(String, Vec<u8>)> =
            sqlx::query_as("SELECT content_type, data FROM photos WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut *conn)
                .await?;

        row.map(|(content_type, data)| -> Result<Photo> {
            let format = content_type
                .parse::<PhotoFormat>()
                .map_err(|e| Error::Corrupted(format!("photo {}: {}", key, e)))?;
            Ok(Photo {
                key: key.to_owned(),
                format,
                data,
            })
        })
        .transpose()
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.lock().await;
        debug!("Removing photo blob {}", key);
        sqlx::query("DELETE FROM photos WHERE key = ?")
            .bind(key)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> NewPhoto {
        NewPhoto {
            file_name: Some("me.png".to_owned()),
            format: PhotoFormat::Png,
            data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
        }
    }

    async fn assert_store_and_fetch(store: &dyn PhotoStore) {
        let key = store.store(png()).await.unwrap();
        assert!(key.ends_with(".png"));

        let photo = store.fetch(&key).await.unwrap().unwrap();
        assert_eq!(photo.format, PhotoFormat::Png);
        assert_eq!(photo.data, png().data);

        let other = store.store(png()).await.unwrap();
        assert_ne!(key, other);

        store.delete(&key).await.unwrap();
        assert!(store.fetch(&key).await.unwrap().is_none());
        assert!(store.fetch(&other).await.unwrap().is_some());
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn directory_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPhotoStore::open(dir.path().join("photos"))
            .await
            .unwrap();

        assert_store_and_fetch(&store).await;
    }

    #[tokio::test]
    async fn directory_store_ignores_foreign_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("secret.png"), b"x").unwrap();
        let store = DirectoryPhotoStore::open(dir.path().join("photos"))
            .await
            .unwrap();

        assert!(store.fetch("../secret.png").await.unwrap().is_none());
        assert!(store
            .fetch(&format!("{}.png", Uuid::new_v4()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sqlite_store_round_trip() {
        let store = SqlitePhotoStore::new(Connection::in_memory().await.unwrap());

        assert_store_and_fetch(&store).await;
        assert!(store.fetch("missing.png").await.unwrap().is_none());
    }
}

use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFormat {
    Jpeg,
    Png,
}

impl PhotoFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "image/jpeg",
            PhotoFormat::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "jpg",
            PhotoFormat::Png => "png",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(PhotoFormat::Jpeg),
            "png" => Some(PhotoFormat::Png),
            _ => None,
        }
    }
}

impl fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported photo type \"{0}\", expected JPEG or PNG")]
pub struct UnsupportedPhotoType(pub String);

impl FromStr for PhotoFormat {
    type Err = UnsupportedPhotoType;

    fn from_str(content_type: &str) -> Result<Self, Self::Err> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(PhotoFormat::Jpeg),
            "image/png" => Ok(PhotoFormat::Png),
            _ => Err(UnsupportedPhotoType(content_type.to_owned())),
        }
    }
}

/// Uploaded image waiting to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    pub file_name: Option<String>,
    pub format: PhotoFormat,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub key: String,
    pub format: PhotoFormat,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_content_types() {
        assert_eq!("image/jpeg".parse(), Ok(PhotoFormat::Jpeg));
        assert_eq!("image/jpg".parse(), Ok(PhotoFormat::Jpeg));
        assert_eq!("IMAGE/PNG".parse(), Ok(PhotoFormat::Png));
    }

    #[test]
    fn rejects_other_content_types() {
        assert_eq!(
            "image/gif".parse::<PhotoFormat>(),
            Err(UnsupportedPhotoType("image/gif".to_owned()))
        );
        assert!("application/pdf".parse::<PhotoFormat>().is_err());
    }

    #[test]
    fn maps_extensions() {
        assert_eq!(PhotoFormat::from_extension("JPEG"), Some(PhotoFormat::Jpeg));
        assert_eq!(PhotoFormat::from_extension("png"), Some(PhotoFormat::Png));
        assert_eq!(PhotoFormat::from_extension("bmp"), None);
        assert_eq!(PhotoFormat::Jpeg.extension(), "jpg");
    }
}

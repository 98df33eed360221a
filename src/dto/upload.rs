use crate::Error;
use actix_multipart::Multipart;
use futures::TryStreamExt;

/// The `file` part of a multipart form.
pub struct Upload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Reads the part named `file`, ignoring any other parts.
    pub async fn read(mut payload: Multipart) -> Result<Self, Error> {
        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            if field.name() != Some("file") {
                continue;
            }
            let filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(String::from);
            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                bytes.extend_from_slice(&chunk);
            }
            return Ok(Self { filename, bytes });
        }
        Err(Error::invalid("Missing 'file' field in multipart form"))
    }
}

fn malformed(e: actix_multipart::MultipartError) -> Error {
    Error::invalid(format!("Malformed multipart upload: {}", e))
}

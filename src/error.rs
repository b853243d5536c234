//! Error boundary. The core estimator never returns `Result` — every failure
//! mode that can occur lives at the IO edges (texture decode, image write).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to decode texture")]
    TextureDecode {
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write output image to {path}")]
    ImageWrite {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

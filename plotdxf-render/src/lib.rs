pub mod align;
pub mod canvas;
pub mod clip;
pub mod color;
pub mod hatch;
pub mod path;
pub mod renderer;
pub mod text;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum RenderError {
        #[error("unsupported text alignment keyword: {0}")]
        UnsupportedAlignment(String),
    }
}

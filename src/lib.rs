//! petpet - template-driven meme generation
//!
//! This library composites a user-supplied image (usually an avatar) into
//! predefined templates and serializes the result:
//! - Templates live on disk as a config file plus numbered PNG frames
//! - Avatars are resized (fill, cover, fit), optionally cropped to a circle
//!   and placed per frame
//! - Optional caption text is drawn with a template font or a built-in bitmap font
//! - Output is a PNG (static) or an infinitely looping GIF (animated)
//!
//! ```no_run
//! use petpet::{GenerateRequest, Generator, OutputKind};
//!
//! let generator = Generator::new("templates");
//! let avatar = std::fs::read("avatar.png").unwrap();
//! let generated = generator
//!     .generate(&GenerateRequest {
//!         source: &avatar,
//!         template: "petpet",
//!         text: None,
//!         kind: OutputKind::Animated,
//!     })
//!     .unwrap();
//! std::fs::write("petpet.gif", &generated.bytes).unwrap();
//! ```

mod cache;
pub mod cli;
pub mod color;
pub mod composite;
pub mod config;
pub mod encode;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod logging;
pub mod models;
pub mod template;
pub mod text;
pub mod transform;

pub use error::{ErrorKind, PetpetError, Result, Warning};
pub use generator::{
    generate, BatchJob, BatchOutcome, GenerateRequest, Generated, Generator, Stage,
};
pub use models::{FitMode, OutputKind, Rect, TemplateConfig, TemplateType};
pub use template::{list_templates, Template, TemplateInfo, TemplateStore};

//! Meme generation: template + source image -> encoded PNG or GIF
//!
//! One call runs `Start -> ConfigLoaded -> FramesLoaded -> (PositionResolved ->
//! AvatarTransformed -> Composed)* -> Encoded -> Done`. A failure at any stage
//! aborts the call with the originating error; no partial output escapes.

use crate::composite::{compose_frame, AvatarPlacement};
use crate::encode::{encode_animated, encode_static};
use crate::error::{PetpetError, Result, Warning};
use crate::geometry::resolve_rect;
use crate::models::OutputKind;
use crate::template::{Template, TemplateStore};
use crate::text::TextOverlay;
use crate::transform::{circular_mask, decode_source, resize};
use image::RgbaImage;
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Progress of a generation call, reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    ConfigLoaded,
    FramesLoaded,
    PositionResolved(usize),
    AvatarTransformed(usize),
    Composed(usize),
    Encoded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Start => f.write_str("start"),
            Stage::ConfigLoaded => f.write_str("config_loaded"),
            Stage::FramesLoaded => f.write_str("frames_loaded"),
            Stage::PositionResolved(i) => write!(f, "position_resolved[{}]", i),
            Stage::AvatarTransformed(i) => write!(f, "avatar_transformed[{}]", i),
            Stage::Composed(i) => write!(f, "composed[{}]", i),
            Stage::Encoded => f.write_str("encoded"),
        }
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(stage = %next, "stage");
    *stage = next;
}

/// Input of one generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    /// Encoded source image (PNG, JPEG, WebP, GIF, BMP, TIFF, ...)
    pub source: &'a [u8],
    pub template: &'a str,
    /// Caller text for `$txt1`; ignored by templates without a text rule
    pub text: Option<&'a str>,
    pub kind: OutputKind,
}

/// Output of a successful generation call.
#[derive(Debug, Clone)]
pub struct Generated {
    pub bytes: Vec<u8>,
    pub kind: OutputKind,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    /// Per-frame delay written to animated output
    pub delay_ms: Option<u32>,
    pub warnings: Vec<Warning>,
}

/// One entry of a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub template: String,
    /// `None` picks the template's natural kind
    pub kind: Option<OutputKind>,
    pub text: Option<String>,
}

impl BatchJob {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into(), kind: None, text: None }
    }

    pub fn with_kind(mut self, kind: OutputKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Result of one batch entry
#[derive(Debug)]
pub struct BatchOutcome {
    pub job: BatchJob,
    pub result: Result<Generated>,
}

/// Generation engine bound to a templates directory.
///
/// Calls share nothing but the optional template cache, so one generator can
/// serve concurrent calls from several threads.
pub struct Generator {
    store: TemplateStore,
}

impl Generator {
    pub fn new(templates_root: impl Into<PathBuf>) -> Self {
        Self::with_store(TemplateStore::new(templates_root))
    }

    pub fn with_store(store: TemplateStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// The output kind matching the template's declared type.
    pub fn natural_kind(&self, template: &str) -> Result<OutputKind> {
        let config = self.store.load_config(template)?;
        Ok(OutputKind::for_template_type(config.template_type))
    }

    /// Run one generation call.
    pub fn generate(&self, request: &GenerateRequest<'_>) -> Result<Generated> {
        let mut stage = Stage::Start;
        match self.run(request, &mut stage) {
            Ok(generated) => {
                info!(
                    template = request.template,
                    kind = ?generated.kind,
                    frames = generated.frame_count,
                    bytes = generated.bytes.len(),
                    warnings = generated.warnings.len(),
                    "generated"
                );
                Ok(generated)
            }
            Err(e) => {
                warn!(template = request.template, stage = %stage, kind = %e.kind(), "generation failed: {}", e);
                Err(e)
            }
        }
    }

    fn run(&self, request: &GenerateRequest<'_>, stage: &mut Stage) -> Result<Generated> {
        let template =
            self.store.load_with(request.template, || advance(stage, Stage::ConfigLoaded))?;
        advance(stage, Stage::FramesLoaded);
        debug!(template = request.template, frames = template.frames.len(), "template loaded");

        let avatar = decode_source(request.source)?;
        let mut warnings = Vec::new();
        let overlay = self.prepare_text(&template, request.text, &mut warnings);

        let frames = match request.kind {
            OutputKind::Static => &template.frames[..1],
            OutputKind::Animated => &template.frames[..],
        };

        let mut composed = Vec::with_capacity(frames.len());
        let mut last_transform: Option<((u32, u32), RgbaImage)> = None;
        for (index, frame) in frames.iter().enumerate() {
            let spec = template.config.primary_avatar();
            let rect = spec.and_then(|s| resolve_rect(s.positions.as_slice(), index));
            advance(stage, Stage::PositionResolved(index));

            let placement = match (spec, rect) {
                (Some(spec), Some(rect)) => {
                    let reuse = matches!(&last_transform, Some((size, _)) if *size == rect.size());
                    if !reuse {
                        let fit = spec.fit_for(request.kind);
                        let mut transformed = resize(&avatar, rect.size(), fit);
                        if spec.round {
                            transformed = circular_mask(&transformed);
                        }
                        last_transform = Some((rect.size(), transformed));
                    }
                    advance(stage, Stage::AvatarTransformed(index));
                    last_transform
                        .as_ref()
                        .map(|(_, image)| AvatarPlacement { image, rect, on_top: spec.on_top })
                }
                _ => None,
            };

            composed.push(compose_frame(frame, placement, overlay.as_ref()));
            advance(stage, Stage::Composed(index));
        }

        let (width, height) = composed[0].dimensions();
        let delay_ms = template.config.frame_delay_ms;
        let bytes = match request.kind {
            OutputKind::Static => encode_static(&composed[0])?,
            OutputKind::Animated => encode_animated(&composed, delay_ms)?,
        };
        advance(stage, Stage::Encoded);

        Ok(Generated {
            bytes,
            kind: request.kind,
            frame_count: composed.len(),
            width,
            height,
            delay_ms: (request.kind == OutputKind::Animated).then_some(delay_ms),
            warnings,
        })
    }

    fn prepare_text(
        &self,
        template: &Template,
        text: Option<&str>,
        warnings: &mut Vec<Warning>,
    ) -> Option<TextOverlay> {
        let spec = template.config.primary_text()?;
        let content = text.filter(|t| !t.is_empty())?;

        let (overlay, text_warnings) =
            TextOverlay::prepare(spec, content, &self.store.font_path(&spec.font_name));
        for warning in text_warnings {
            warn!(template = %template.name, "{}", warning);
            warnings.push(warning);
        }
        overlay
    }

    /// Run independent jobs in parallel against one source image.
    ///
    /// Failures are reported per job; one failing template does not stop the
    /// others. Outcomes keep the order of `jobs`.
    pub fn generate_batch(&self, source: &[u8], jobs: &[BatchJob]) -> Vec<BatchOutcome> {
        jobs.par_iter()
            .map(|job| {
                let result = job
                    .kind
                    .map_or_else(|| self.natural_kind(&job.template), Ok)
                    .and_then(|kind| {
                        self.generate(&GenerateRequest {
                            source,
                            template: &job.template,
                            text: job.text.as_deref(),
                            kind,
                        })
                    });
                BatchOutcome { job: job.clone(), result }
            })
            .collect()
    }
}

/// Generate a meme in one call, re-reading the template from disk.
///
/// # Examples
///
/// ```no_run
/// use petpet::{generate, OutputKind};
///
/// let avatar = std::fs::read("avatar.png").unwrap();
/// let gif = generate(&avatar, "petpet", None, "./templates", OutputKind::Animated).unwrap();
/// std::fs::write("petpet.gif", gif).unwrap();
/// ```
pub fn generate(
    source: &[u8],
    template_name: &str,
    text: Option<&str>,
    templates_root: impl Into<PathBuf>,
    kind: OutputKind,
) -> std::result::Result<Vec<u8>, PetpetError> {
    let request = GenerateRequest { source, template: template_name, text, kind };
    Generator::new(templates_root).generate(&request).map(|generated| generated.bytes)
}

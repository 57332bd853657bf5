//! Driving the independent operations of one session over a single container.
//!
//! The image is reconstructed once. Showing it, analysing its spectrum and anonymizing the
//! datastream then run independently: a failure in one is recorded in its [`Outcome`] and the
//! others still run.

use std::io::Write;

use crate::anonymize::AnonymizeReport;
use crate::common::SampleGrid;
use crate::decoder::{Container, DecodedImage};
use crate::error::{DecodingError, Result};

/// Receives a reconstructed image, e.g. to show it on screen.
pub trait Presenter {
    fn present(&mut self, image: &DecodedImage);
}

/// Receives the luminance of a reconstructed image, e.g. to compute and plot its 2-D spectrum.
pub trait SpectrumAnalyzer {
    fn analyze(&mut self, luminance: &SampleGrid);
}

/// Result of one operation in a session.
#[derive(Debug)]
pub enum Outcome<T> {
    Done(T),
    Failed(DecodingError),
    /// Not attempted: nothing to hand the result to, or a step it depends on failed.
    Skipped,
}

impl<T> Outcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }

    pub fn error(&self) -> Option<&DecodingError> {
        match self {
            Outcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value),
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// Outcomes of every operation of a session, in the order they ran.
#[derive(Debug)]
pub struct SessionReport {
    pub decode: Outcome<()>,
    pub presentation: Outcome<()>,
    pub spectrum: Outcome<()>,
    pub anonymization: Outcome<AnonymizeReport>,
}

/// Reconstructs the image of `container` once, hands it to the collaborators that are present and
/// writes the anonymized datastream to `out`.
///
/// Presentation and spectral analysis are skipped when reconstruction fails. Anonymization works
/// on the raw chunks and runs regardless.
pub fn run_session<W: Write>(
    container: &Container,
    presenter: Option<&mut dyn Presenter>,
    analyzer: Option<&mut dyn SpectrumAnalyzer>,
    out: &mut W,
) -> SessionReport {
    let (decode, image) = match container.decode() {
        Ok(image) => (Outcome::Done(()), Some(image)),
        Err(err) => {
            log::error!("could not reconstruct the image: {}", err);
            (Outcome::Failed(err), None)
        }
    };

    let presentation = match (&image, presenter) {
        (Some(image), Some(presenter)) => {
            presenter.present(image);
            Outcome::Done(())
        }
        _ => Outcome::Skipped,
    };

    let spectrum = match (&image, analyzer) {
        (Some(image), Some(analyzer)) => {
            analyzer.analyze(&image.grid.luminance());
            Outcome::Done(())
        }
        _ => Outcome::Skipped,
    };

    let anonymization = Outcome::from(container.anonymize(out));
    if let Some(err) = anonymization.error() {
        log::error!("could not anonymize: {}", err);
    }

    SessionReport {
        decode,
        presentation,
        spectrum,
        anonymization,
    }
}

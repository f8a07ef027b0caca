use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use pfg_core::{PfgError, Result};
use serde::{Deserialize, Serialize};

use crate::dispatch::DrawDispatcher;
use crate::obj_output::ObjRoutines;
use crate::postscript::PostscriptRoutines;
use crate::view_volume::ViewVolumeRoutines;

/// File-producing and measuring backends selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Postscript,
    Obj,
    ViewVolume,
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Postscript => "postscript",
            Self::Obj => "obj",
            Self::ViewVolume => "view_volume",
        }
    }

    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "ps" | "eps" => Some(Self::Postscript),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }
}

impl FromStr for OutputKind {
    type Err = PfgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ps" | "postscript" => Ok(Self::Postscript),
            "obj" => Ok(Self::Obj),
            "view_volume" | "volume" => Ok(Self::ViewVolume),
            other => Err(PfgError::InvalidOperation(format!("unknown output kind '{other}'"))),
        }
    }
}

/// Build the dispatcher for one pass writing to `out`.
pub fn create_dispatcher<'w>(kind: OutputKind, out: Box<dyn Write + 'w>, name: &str) -> Box<dyn DrawDispatcher + 'w> {
    match kind {
        OutputKind::Postscript => Box::new(PostscriptRoutines::new(out)),
        OutputKind::Obj => Box::new(ObjRoutines::new(out, name)),
        OutputKind::ViewVolume => Box::new(ViewVolumeRoutines::new()),
    }
}

/// Dispatcher writing to a new file at `path`.
pub fn create_file_dispatcher(kind: OutputKind, path: impl AsRef<Path>) -> Result<Box<dyn DrawDispatcher>> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pfg")
        .to_string();
    let file = BufWriter::new(File::create(path)?);
    Ok(create_dispatcher(kind, Box::new(file), &name))
}

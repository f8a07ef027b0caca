//! Drawing side of the patch engine.
//!
//! The turtle interpreter and the surface emission code talk to one
//! [`DrawDispatcher`] per pass. Backends: [`GlRoutines`] (immediate mode),
//! [`PostscriptRoutines`], [`ObjRoutines`] and [`ViewVolumeRoutines`].

pub mod camera;
pub mod config;
pub mod connector;
pub mod dispatch;
pub mod gl;
pub mod interpret;
pub mod obj_output;
pub mod output;
pub mod postscript;
pub mod primitives;
pub mod tmesh;
pub mod turtle;
pub mod view_volume;

pub use camera::Camera;
pub use config::{DrawParams, LineStyle, Palette, RenderConfig, Rgb, ViewParams};
pub use connector::{ConnectorState, Deferred, NodeConnector};
pub use dispatch::{DrawDispatcher, TmeshVertex};
pub use gl::{CommandRecorder, GlCommand, GlContext, GlRoutines, Primitive};
pub use interpret::{interpret, parse_program, Interpreter, Module};
pub use obj_output::ObjRoutines;
pub use output::{create_dispatcher, create_file_dispatcher, OutputKind};
pub use postscript::PostscriptRoutines;
pub use tmesh::{determine_vertex_shading, draw_grid_tmesh, draw_surface_tmesh, ShadingPolicy};
pub use turtle::Turtle;
pub use view_volume::ViewVolumeRoutines;

mod backend;
mod bubble_menu;
pub mod builtin;
mod config;
mod conversation;
mod error;
mod extension;
mod host;
mod icon;
mod memory;
mod palette;
mod presets;
mod registry;
mod surface;
mod toolbar;

pub use crate::backend::*;
pub use crate::bubble_menu::*;
pub use crate::config::*;
pub use crate::conversation::*;
pub use crate::error::*;
pub use crate::extension::*;
pub use crate::host::*;
pub use crate::icon::*;
pub use crate::memory::*;
pub use crate::palette::*;
pub use crate::presets::*;
pub use crate::registry::*;
pub use crate::surface::*;
pub use crate::toolbar::*;

pub mod archive;
pub mod aur;
pub mod commands;
pub mod error;
pub mod http;
pub mod install;
pub mod makepkg;
pub mod package;
pub mod pacman;
pub mod pkgbuild;
pub mod resolver;
pub mod runtime;
pub mod update;
pub mod vercmp;

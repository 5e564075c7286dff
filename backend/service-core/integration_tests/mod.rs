mod config;
mod fallback;
mod helpers;
mod probe;
mod supervisor;

mod protocol;
mod service;

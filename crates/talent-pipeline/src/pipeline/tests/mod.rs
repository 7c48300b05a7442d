mod common;
mod filters;

mod arguments;
mod caching;
mod eager;
mod errors;
mod fragments;

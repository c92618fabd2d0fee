pub(crate) mod display;
pub(crate) mod refresh_loop;
pub(crate) mod slot;

pub mod keyed_mutex;
pub mod path_guard;

// This is a stub lib.rs generated by `cargo hakari`.

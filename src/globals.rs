pub const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

pub const PROGRAM_VERSION: &str = match option_env!("VERGEN_GIT_DESCRIBE") {
    Some(x) => x,
    None => env!("CARGO_PKG_VERSION"),
};

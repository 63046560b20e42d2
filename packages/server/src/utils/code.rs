use rand::Rng;
use rand::distr::Alphanumeric;

pub const CONFIRMATION_CODE_LENGTH: usize = 12;

/// Generate a random alphanumeric confirmation code.
pub fn generate_confirmation_code() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(CONFIRMATION_CODE_LENGTH)
        .map(char::from)
        .collect()
}

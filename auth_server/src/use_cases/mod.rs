pub mod award_winner;
pub mod jwt;
pub mod login;
pub mod password;
pub mod scoreboard;
pub mod signup;
pub mod verify_token;

#[cfg(test)]
pub(crate) mod test_support;

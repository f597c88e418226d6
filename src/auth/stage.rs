use std::fmt;

/// The two exchanges of the login flow.
///
/// Each stage knows where its value sits inside the service response:
/// `Body/<response>/<return>` in the envelope, then `<leaf>` in the
/// document carried by the return field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Seed,
    Token,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Seed => "seed",
            Stage::Token => "token",
        }
    }

    pub fn response_element(&self) -> &'static str {
        match self {
            Stage::Seed => "getSeedResponse",
            Stage::Token => "getTokenResponse",
        }
    }

    pub fn return_element(&self) -> &'static str {
        match self {
            Stage::Seed => "getSeedReturn",
            Stage::Token => "getTokenReturn",
        }
    }

    pub fn leaf_element(&self) -> &'static str {
        match self {
            Stage::Seed => "SEMILLA",
            Stage::Token => "TOKEN",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

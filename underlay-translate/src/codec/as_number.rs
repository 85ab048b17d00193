use super::CodecError;

const HALF: u32 = 65_536;

/// A 32-bit AS number split into its `xx.yy` halves; `xx` is 0 for 16-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsDot {
    pub xx: u32,
    pub yy: u32,
}

pub fn as_to_dot(value: u32) -> AsDot {
    AsDot {
        xx: value / HALF,
        yy: value % HALF,
    }
}

pub fn as_from_dot(xx: u32, yy: u32) -> Result<u32, CodecError> {
    for half in [xx, yy] {
        if half >= HALF {
            return Err(CodecError::AsHalf(half));
        }
    }
    Ok(xx * HALF + yy)
}

/// Parse an AS number written as plain decimal or as `xx.yy`.
pub fn parse_as(text: &str) -> Result<u32, CodecError> {
    let text = text.trim();
    let invalid = || CodecError::AsNumber(text.to_string());
    match text.split_once('.') {
        Some((xx, yy)) => {
            let xx = xx.parse::<u32>().map_err(|_| invalid())?;
            let yy = yy.parse::<u32>().map_err(|_| invalid())?;
            as_from_dot(xx, yy)
        }
        None => text.parse::<u32>().map_err(|_| invalid()),
    }
}

//! Token symbols and fixed-point amounts
//!
//! Balances are kept as integer atoms (wei-style base units) with a
//! per-symbol decimal scale. Decimal strings exist only at the presentation
//! boundary; all internal arithmetic and comparison is integral.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::SessionError;

/// The fixed symbol set tracked by a session: the chain-native token and
/// the stablecoin used for loan repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TokenSymbol {
    Native,
    Stable,
}

impl TokenSymbol {
    pub const ALL: [TokenSymbol; 2] = [TokenSymbol::Native, TokenSymbol::Stable];

    pub fn ticker(&self) -> &'static str {
        match self {
            TokenSymbol::Native => "ETH",
            TokenSymbol::Stable => "USDC",
        }
    }

    /// Decimal places of the token's base unit.
    pub fn scale(&self) -> u8 {
        match self {
            TokenSymbol::Native => 18,
            TokenSymbol::Stable => 6,
        }
    }
}

impl fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// Fixed-point token amount: `atoms * 10^-scale`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Amount {
    atoms: u128,
    scale: u8,
}

impl Amount {
    pub fn zero(symbol: TokenSymbol) -> Self {
        Self {
            atoms: 0,
            scale: symbol.scale(),
        }
    }

    pub fn from_atoms(atoms: u128, symbol: TokenSymbol) -> Self {
        Self {
            atoms,
            scale: symbol.scale(),
        }
    }

    pub fn atoms(&self) -> u128 {
        self.atoms
    }

    pub fn is_zero(&self) -> bool {
        self.atoms == 0
    }

    /// Parse a decimal string ("12.5", "0.000001") into an amount at the
    /// symbol's scale. More fractional digits than the scale allows is an
    /// error rather than a silent truncation.
    pub fn parse(s: &str, symbol: TokenSymbol) -> Result<Self, SessionError> {
        let scale = symbol.scale() as usize;
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(SessionError::InvalidAmount(format!("Empty amount: {:?}", s)));
        }
        if frac_part.len() > scale {
            return Err(SessionError::InvalidAmount(format!(
                "{} supports at most {} decimal places, got {:?}",
                symbol, scale, s
            )));
        }

        let int: u128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|e| SessionError::InvalidAmount(format!("{:?}: {}", s, e)))?
        };
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part
                .parse()
                .map_err(|e| SessionError::InvalidAmount(format!("{:?}: {}", s, e)))?
        };

        let frac_scaled = frac * 10u128.pow((scale - frac_part.len()) as u32);
        let atoms = int
            .checked_mul(10u128.pow(scale as u32))
            .and_then(|v| v.checked_add(frac_scaled))
            .ok_or_else(|| SessionError::InvalidAmount(format!("Amount overflow: {:?}", s)))?;

        Ok(Self {
            atoms,
            scale: symbol.scale(),
        })
    }

    fn parts(&self) -> (u128, u128) {
        let divisor = 10u128.pow(self.scale as u32);
        (self.atoms / divisor, self.atoms % divisor)
    }
}

// Equality must agree with `Ord`: amounts at different scales compare by
// numeric value, not by representation.
impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Amount {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare integer parts first, then fractions normalized to a common
        // scale. Fractions are < 10^18 so the rescale cannot overflow u128.
        let max_scale = self.scale.max(other.scale);
        let (self_int, self_frac) = self.parts();
        let (other_int, other_frac) = other.parts();
        let self_frac = self_frac * 10u128.pow((max_scale - self.scale) as u32);
        let other_frac = other_frac * 10u128.pow((max_scale - other.scale) as u32);
        self_int.cmp(&other_int).then(self_frac.cmp(&other_frac))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (int, frac) = self.parts();
        if frac == 0 {
            return write!(f, "{}", int);
        }
        let frac_str = format!("{:0width$}", frac, width = self.scale as usize);
        write!(f, "{}.{}", int, frac_str.trim_end_matches('0'))
    }
}

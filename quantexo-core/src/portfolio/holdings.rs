//! Per-holding valuation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    pub avg_buy_price: f64,
    pub last_traded_price: f64,
    pub prev_close_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub holding: Holding,
    pub current_value: f64,
    pub invested: f64,
    pub unrealised: f64,
    pub daily_pnl: f64,
    /// None when nothing was invested.
    pub pnl_pct: Option<f64>,
}

impl Holding {
    pub fn new(
        symbol: &str,
        quantity: f64,
        avg_buy_price: f64,
        last_traded_price: f64,
        prev_close_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            quantity,
            avg_buy_price,
            last_traded_price,
            prev_close_price,
        }
    }

    pub fn value(&self) -> HoldingValuation {
        let current_value = self.quantity * self.last_traded_price;
        let invested = self.quantity * self.avg_buy_price;
        let unrealised = current_value - invested;
        HoldingValuation {
            holding: self.clone(),
            current_value,
            invested,
            unrealised,
            daily_pnl: (self.last_traded_price - self.prev_close_price) * self.quantity,
            pnl_pct: (invested != 0.0).then(|| unrealised / invested * 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_a_holding() {
        let v = Holding::new(" nabil ", 10.0, 500.0, 550.0, 540.0).value();
        assert_eq!(v.holding.symbol, "NABIL");
        assert_eq!(v.current_value, 5500.0);
        assert_eq!(v.invested, 5000.0);
        assert_eq!(v.unrealised, 500.0);
        assert_eq!(v.daily_pnl, 100.0);
        assert_eq!(v.pnl_pct, Some(10.0));
    }

    #[test]
    fn zero_invested_has_no_percentage() {
        let v = Holding::new("BONUS", 10.0, 0.0, 100.0, 100.0).value();
        assert_eq!(v.pnl_pct, None);
        assert_eq!(v.unrealised, 1000.0);
    }
}

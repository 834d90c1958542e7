//! Discounted cash flow calculation.
//!
//! Self-contained pure function behind a single endpoint. Validation errors
//! carry the message shown to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_forecast_years() -> u32 {
    5
}

fn default_terminal_growth() -> f64 {
    0.03
}

fn default_shares_outstanding() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInput {
    /// Base-year free cash flow.
    pub current_fcf: f64,
    /// Annual growth rate during the explicit forecast, as a decimal.
    pub growth_rate: f64,
    #[serde(default = "default_forecast_years")]
    pub forecast_years: u32,
    #[serde(default = "default_terminal_growth")]
    pub terminal_growth: f64,
    /// Discount rate / WACC, as a decimal.
    pub discount_rate: f64,
    #[serde(default)]
    pub net_debt: f64,
    #[serde(default = "default_shares_outstanding")]
    pub shares_outstanding: f64,
    /// Explicit FCF override; length must equal forecast_years.
    #[serde(default)]
    pub manual_fcfs: Option<Vec<f64>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum DcfError {
    #[error("discount_rate must be greater than terminal_growth for Gordon Growth terminal value")]
    DiscountNotAboveTerminal,
    #[error("terminal_growth must be greater than -1.0")]
    TerminalGrowthTooLow,
    #[error("growth_rate must be greater than -1.0")]
    GrowthRateTooLow,
    #[error("discount_rate must be greater than 0")]
    DiscountRateNotPositive,
    #[error("forecast_years must be between 1 and 50")]
    ForecastYearsOutOfRange,
    #[error("shares_outstanding must be greater than 0")]
    SharesNotPositive,
    #[error("manual_fcfs length must equal forecast_years when provided")]
    ManualFcfsLengthMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcfYearRow {
    pub year: u32,
    pub fcf: f64,
    pub discount_factor: f64,
    pub present_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcfResult {
    pub inputs: DcfInput,
    pub rows: Vec<DcfYearRow>,
    pub pv_explicit: f64,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub per_share_value: f64,
}

/// Explicit-forecast DCF with a Gordon Growth terminal value.
pub fn calculate_dcf(input: DcfInput) -> Result<DcfResult, DcfError> {
    if input.discount_rate <= 0.0 {
        return Err(DcfError::DiscountRateNotPositive);
    }
    if input.discount_rate <= input.terminal_growth {
        return Err(DcfError::DiscountNotAboveTerminal);
    }
    if input.terminal_growth <= -1.0 {
        return Err(DcfError::TerminalGrowthTooLow);
    }
    if input.growth_rate <= -1.0 {
        return Err(DcfError::GrowthRateTooLow);
    }
    if input.forecast_years < 1 || input.forecast_years > 50 {
        return Err(DcfError::ForecastYearsOutOfRange);
    }
    if input.shares_outstanding <= 0.0 {
        return Err(DcfError::SharesNotPositive);
    }

    let fcfs: Vec<f64> = match &input.manual_fcfs {
        Some(manual) => {
            if manual.len() != input.forecast_years as usize {
                return Err(DcfError::ManualFcfsLengthMismatch);
            }
            manual.clone()
        }
        None => (1..=input.forecast_years)
            .map(|year| input.current_fcf * (1.0 + input.growth_rate).powi(year as i32))
            .collect(),
    };

    let rows: Vec<DcfYearRow> = fcfs
        .iter()
        .enumerate()
        .map(|(i, &fcf)| {
            let year = i as u32 + 1;
            let discount_factor = (1.0 + input.discount_rate).powi(year as i32);
            DcfYearRow {
                year,
                fcf,
                discount_factor,
                present_value: fcf / discount_factor,
            }
        })
        .collect();

    let pv_explicit: f64 = rows.iter().map(|r| r.present_value).sum();

    let final_fcf = fcfs[fcfs.len() - 1];
    let terminal_value = final_fcf * (1.0 + input.terminal_growth)
        / (input.discount_rate - input.terminal_growth);
    let discounted_terminal_value =
        terminal_value / (1.0 + input.discount_rate).powi(input.forecast_years as i32);

    let enterprise_value = pv_explicit + discounted_terminal_value;
    let equity_value = enterprise_value - input.net_debt;
    let per_share_value = equity_value / input.shares_outstanding;

    Ok(DcfResult {
        inputs: input,
        rows,
        pv_explicit,
        terminal_value,
        discounted_terminal_value,
        enterprise_value,
        equity_value,
        per_share_value,
    })
}

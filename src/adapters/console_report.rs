//! Plain-text report written to any `io::Write` (stdout from the CLI).
//!
//! Figures are rounded to two decimals; an undefined Sharpe ratio is shown
//! with its reason instead of a number.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::MomentumError;
use crate::domain::grid::GridEnumeration;
use crate::domain::metrics::StatsError;
use crate::domain::pipeline::{DateWindow, RunConfig, RunReport};
use crate::domain::universe::SkipReason;
use crate::ports::report_port::ReportPort;
use std::io::Write;

pub struct ConsoleReport<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn fmt_currency(value: f64) -> String {
    let digits = format!("{:.2}", value.abs());
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn fmt_sharpe(sharpe: &Result<f64, StatsError>) -> String {
    match sharpe {
        Ok(value) => format!("{:.2}", value),
        Err(reason) => format!("undefined ({})", reason),
    }
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::FetchFailed => "fetch failed",
        SkipReason::NoData => "no data",
        SkipReason::InvalidSeries => "invalid series",
    }
}

pub fn render_run(report: &RunReport) -> String {
    let opt = &report.optimization;
    let val = &report.validation;

    let mut output = format!("=== Optimization (train {}) ===\n", report.train);
    output.push_str(&format!("Objective:          {}\n", opt.objective));
    output.push_str(&format!(
        "Candidates:         {} evaluated, {} pruned, {} undefined\n",
        opt.evaluated, opt.pruned, opt.undefined
    ));
    output.push_str(&format!("Best Lookback:      {}\n", opt.best_lookback()));
    output.push_str(&format!("Best Threshold:     {:.2}\n", opt.best_threshold()));
    output.push_str(&format!(
        "Training Sharpe:    {}\n",
        fmt_sharpe(&opt.best_sharpe)
    ));
    output.push_str(&format!(
        "Training Return:    {}\n",
        fmt_pct(opt.best_cumulative_return)
    ));

    output.push_str(&format!("\n=== Out-of-Sample (test {}) ===\n", report.test));
    output.push_str(&format!(
        "Symbols:            {} used, {} excluded\n",
        val.symbols_used.len(),
        val.symbols_excluded.len()
    ));
    output.push_str(&format!(
        "Cumulative Return:  {}\n",
        fmt_pct(val.cumulative_return)
    ));
    output.push_str(&format!(
        "Sharpe Ratio:       {}\n",
        fmt_sharpe(&val.sharpe_ratio)
    ));

    if !report.skipped.is_empty() {
        output.push_str(&format!(
            "\n=== Skipped ({} of {} symbols) ===\n",
            report.skipped.len(),
            report.symbols_requested
        ));
        for s in &report.skipped {
            output.push_str(&format!(
                "  {}: {} ({})\n",
                s.symbol,
                skip_label(s.reason),
                s.message
            ));
        }
    }
    output
}

pub fn render_backtest(result: &BacktestResult, window: &DateWindow) -> String {
    let mut output = format!("=== Backtest: {} ({}) ===\n", result.symbol, result.params);
    output.push_str(&format!("Period:               {}\n", window));
    output.push_str(&format!(
        "Initial Capital:      {}\n",
        fmt_currency(result.initial_capital)
    ));
    output.push_str(&format!(
        "Final Strategy Value: {}\n",
        fmt_currency(result.final_strategy_value)
    ));
    output.push_str(&format!(
        "Final Market Value:   {}\n",
        fmt_currency(result.final_market_value)
    ));
    output.push_str(&format!(
        "Strategy Return:      {}\n",
        fmt_pct(result.total_return)
    ));
    output.push_str(&format!(
        "Market Return:        {}\n",
        fmt_pct(result.market_return)
    ));
    output.push_str(&format!(
        "Sharpe Ratio:         {}\n",
        fmt_sharpe(&result.sharpe_ratio)
    ));
    output.push_str(&format!(
        "Max Drawdown:         {}\n",
        fmt_pct(result.max_drawdown)
    ));
    output
}

pub fn render_check(config: &RunConfig, enumeration: &GridEnumeration) -> String {
    let mut output = String::from("=== Configuration OK ===\n");
    output.push_str(&format!("Symbols:     {}\n", config.symbols.join(", ")));
    output.push_str(&format!("Train:       {}\n", config.train));
    output.push_str(&format!("Test:        {}\n", config.test));
    output.push_str(&format!("Objective:   {}\n", config.objective));
    output.push_str(&format!(
        "Grid:        {} candidates ({} pruned)\n",
        enumeration.candidates.len(),
        enumeration.pruned
    ));
    output
}

impl<W: Write> ReportPort for ConsoleReport<W> {
    fn write_run(&mut self, report: &RunReport) -> Result<(), MomentumError> {
        self.out.write_all(render_run(report).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_backtest(
        &mut self,
        result: &BacktestResult,
        window: &DateWindow,
    ) -> Result<(), MomentumError> {
        self.out
            .write_all(render_backtest(result, window).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    fn write_check(
        &mut self,
        config: &RunConfig,
        enumeration: &GridEnumeration,
    ) -> Result<(), MomentumError> {
        self.out
            .write_all(render_check(config, enumeration).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

//! Visualization utilities for optimization results.
//!
//! Generates SVG charts of the best score per generation/iteration and of
//! the ordered quantities against each product's demand headroom.

use crate::problem::Problem;
use crate::solution::OptimizationResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const SERIES_COLORS: [&str; 4] = ["#3498db", "#e67e22", "#27ae60", "#8e44ad"];

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 400.0,
            margin: 60.0,
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&self, title: &str) -> String {
        format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .grid {{ stroke: #bdc3c7; stroke-width: 0.5; stroke-dasharray: 4,4; }}
    .label {{ font-family: Arial; font-size: 11px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
<text x="{m}" y="25" class="title">{t}</text>
"##,
            w = self.width,
            h = self.height,
            m = self.margin,
            t = escape(title)
        )
    }

    fn axes(&self, y_max: f64) -> String {
        let (m, w, h) = (self.margin, self.width, self.height);
        format!(
            r##"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{r}" y2="{m}" class="grid"/>
<text x="5" y="{ty}" class="label">{y_max:.0}</text>
<text x="5" y="{b}" class="label">0</text>
"##,
            m = m,
            b = h - m,
            r = w - m,
            ty = m + 4.0,
            y_max = y_max
        )
    }

    /// Line chart of the best score history of each result.
    pub fn generate_convergence_svg(&self, results: &[&OptimizationResult]) -> String {
        let mut svg = self.header("Best penalized profit per generation / iteration");

        let longest = results.iter().map(|r| r.history.len()).max().unwrap_or(0).max(2);
        let y_max = results
            .iter()
            .flat_map(|r| r.history.iter().cloned())
            .fold(0.0, f64::max)
            .max(1.0);
        svg.push_str(&self.axes(y_max));

        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;
        let x_scale = plot_width / (longest - 1) as f64;
        let y_scale = plot_height / y_max;
        let baseline = self.height - self.margin;

        for (k, result) in results.iter().enumerate() {
            let color = SERIES_COLORS[k % SERIES_COLORS.len()];

            let mut path = String::new();
            for (i, &score) in result.history.iter().enumerate() {
                let x = self.margin + i as f64 * x_scale;
                let y = baseline - score.max(0.0) * y_scale;
                if i == 0 {
                    path.push_str(&format!("M {:.2} {:.2}", x, y));
                } else {
                    path.push_str(&format!(" L {:.2} {:.2}", x, y));
                }
            }
            if !path.is_empty() {
                svg.push_str(&format!(
                    r##"<path d="{}" stroke="{}" stroke-width="2" fill="none"/>
"##,
                    path, color
                ));
            }

            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" class="label" fill="{}">{} ({:.2})</text>
"##,
                self.width - self.margin - 150.0,
                self.margin + 16.0 * (k + 1) as f64,
                color,
                escape(&result.algorithm),
                result.penalized_profit
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Bar chart of ordered quantity (filled) against demand headroom (outline).
    pub fn generate_quantity_svg(&self, problem: &Problem, result: &OptimizationResult) -> String {
        let mut svg = self.header(&format!(
            "Order quantities ({}) - total profit {:.2}",
            result.algorithm, result.raw_profit
        ));

        let n = problem.len();
        let headroom: Vec<u32> = (0..n).map(|i| problem.max_feasible_qty(i)).collect();
        let y_max = headroom
            .iter()
            .chain(result.quantities.iter())
            .copied()
            .max()
            .unwrap_or(0)
            .max(1) as f64;
        svg.push_str(&self.axes(y_max));

        let plot_width = self.width - 2.0 * self.margin;
        let plot_height = self.height - 2.0 * self.margin;
        let slot = plot_width / n.max(1) as f64;
        let bar = (slot * 0.7).max(1.0);
        let baseline = self.height - self.margin;
        let y_scale = plot_height / y_max;

        for (i, p) in problem.products().iter().enumerate() {
            let x = self.margin + i as f64 * slot + (slot - bar) / 2.0;
            let cap_h = headroom[i] as f64 * y_scale;
            let qty = result.quantities.get(i).copied().unwrap_or(0);
            let qty_h = qty as f64 * y_scale;

            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="#7f8c8d"/>
<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="#3498db"><title>{}: {} / {}</title></rect>
"##,
                x,
                baseline - cap_h,
                bar,
                cap_h,
                x,
                baseline - qty_h,
                bar,
                qty_h,
                escape(&p.name),
                qty,
                headroom[i]
            ));

            if n <= 30 {
                svg.push_str(&format!(
                    r##"<text x="{:.2}" y="{:.2}" class="label">{}</text>
"##,
                    x,
                    baseline + 14.0,
                    escape(&p.name)
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Export the score history for external plotting
    pub fn export_plot_data(&self, results: &[&OptimizationResult]) -> String {
        let mut data = String::new();
        data.push_str("algorithm,step,best_score\n");
        for result in results {
            for (i, score) in result.history.iter().enumerate() {
                data.push_str(&format!("{},{},{:.6}\n", result.algorithm, i + 1, score));
            }
        }
        data
    }
}

//! Cost-structure diagram: account summary, one box per active resource
//! category with its per-type cost breakdown, and the monthly total.

use std::path::Path;

use image::Rgb;
use rust_decimal::Decimal;

use super::canvas::{BoxMark, Canvas, TextMark, ACCENT, GRAY, PRIMARY, SECONDARY};
use crate::error::Result;
use crate::fonts::RasterFonts;
use crate::inventory::Inventory;
use crate::pricing::{amount_due, format_usd, grand_total, monthly_cost};

const WIDTH_UNITS: f32 = 10.0;
const HEIGHT_UNITS: f32 = 8.0;
const WIDTH_PX: u32 = 1800;
const HEIGHT_PX: u32 = 1200;
const DPI: f32 = 150.0;

const LIGHT_BLUE: Rgb<u8> = Rgb([0xAD, 0xD8, 0xE6]);
const LIGHT_YELLOW: Rgb<u8> = Rgb([0xFF, 0xFF, 0xE0]);

/// Text shown instead of the total panel when nothing is billable.
pub const NO_RESOURCES_NOTICE: &str = "No active billable resources this month";

/// Resource categories that may get a box in the diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Compute,
    Kubernetes,
}

impl Category {
    pub fn title(self) -> &'static str {
        match self {
            Category::Compute => "Compute Resources",
            Category::Kubernetes => "Kubernetes (LKE)",
        }
    }

    fn fill(self) -> Rgb<u8> {
        match self {
            Category::Compute => Rgb([0xFF, 0xE0, 0xE0]),
            Category::Kubernetes => Rgb([0xE0, 0xF0, 0xFF]),
        }
    }
}

/// What a box in the diagram stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelRole {
    AccountSummary,
    Category(Category),
    MonthlyTotal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    pub role: PanelRole,
    pub shape: BoxMark,
}

/// Fully laid out diagram. Building it is pure; [`CostDiagram::render`] only paints it.
#[derive(Clone, Debug, PartialEq)]
pub struct CostDiagram {
    pub panels: Vec<Panel>,
    pub texts: Vec<TextMark>,
}

/// Active categories in display order.
pub fn active_categories(inventory: &Inventory) -> Vec<Category> {
    let mut categories = Vec::new();
    if !inventory.instances.is_empty() {
        categories.push(Category::Compute);
    }
    if !inventory.clusters.is_empty() {
        categories.push(Category::Kubernetes);
    }
    categories
}

/// Horizontal centres for `count` evenly spaced category boxes.
pub fn category_positions(count: usize) -> Vec<f32> {
    if count == 0 {
        return Vec::new();
    }
    let spacing = 8.0 / count as f32;
    let start = spacing / 2.0 + 1.0;
    (0..count).map(|index| start + index as f32 * spacing).collect()
}

fn cost_line(amount: Decimal) -> String {
    format!("{}/mo", format_usd(amount))
}

impl CostDiagram {
    pub fn from_inventory(inventory: &Inventory) -> Self {
        let mut diagram = Self {
            panels: Vec::new(),
            texts: Vec::new(),
        };

        diagram.texts.push(
            TextMark::new("Current Month Cost Breakdown", 5.0, 7.5, 20.0)
                .bold()
                .colored(PRIMARY),
        );
        diagram.add_account_summary(inventory);

        let categories = active_categories(inventory);
        for (category, x) in categories.iter().zip(category_positions(categories.len())) {
            diagram.panels.push(Panel {
                role: PanelRole::Category(*category),
                shape: BoxMark {
                    x: x - 0.8,
                    y: 4.2,
                    width: 1.6,
                    height: 1.0,
                    fill: category.fill(),
                    edge: GRAY,
                    edge_px: 2,
                    corner_px: 10,
                },
            });
            diagram
                .texts
                .push(TextMark::new(category.title(), x, 4.7, 11.0).bold());

            match category {
                Category::Compute => diagram.add_compute_breakdown(inventory, x),
                Category::Kubernetes => diagram.add_cluster_breakdown(inventory, x),
            }
        }

        if inventory.is_empty() {
            diagram
                .texts
                .push(TextMark::new(NO_RESOURCES_NOTICE, 5.0, 3.0, 14.0).colored(GRAY));
        } else {
            let total = grand_total(&inventory.instances, &inventory.clusters);
            if total > Decimal::ZERO {
                diagram.add_total_panel(total);
            }
        }

        diagram
    }

    fn add_account_summary(&mut self, inventory: &Inventory) {
        let account = &inventory.account;
        self.panels.push(Panel {
            role: PanelRole::AccountSummary,
            shape: BoxMark {
                x: 0.5,
                y: 5.5,
                width: 9.0,
                height: 1.5,
                fill: LIGHT_BLUE,
                edge: SECONDARY,
                edge_px: 4,
                corner_px: 18,
            },
        });
        self.texts.push(
            TextMark::new(
                format!("Current Month Usage: ${}", account.balance_uninvoiced),
                5.0,
                6.5,
                14.0,
            )
            .bold(),
        );
        self.texts.push(TextMark::new(
            format!("Balance: ${}", account.balance),
            3.0,
            6.0,
            12.0,
        ));
        self.texts.push(
            TextMark::new(
                format!("Total Due: {}", format_usd(amount_due(account))),
                7.0,
                6.0,
                12.0,
            )
            .bold(),
        );
    }

    fn add_compute_breakdown(&mut self, inventory: &Inventory, x: f32) {
        let mut y = 3.8;
        for (instance_type, count) in inventory.instance_type_counts() {
            let unit_cost = monthly_cost(&instance_type);
            let heading = if count > 1 {
                format!("{count}x {instance_type}")
            } else {
                instance_type.clone()
            };
            self.texts.push(TextMark::new(heading, x, y, 9.0).bold());
            y -= 0.25;
            self.texts.push(
                TextMark::new(cost_line(unit_cost * Decimal::from(count)), x, y, 9.0)
                    .colored(ACCENT),
            );
            y -= 0.3;
        }
    }

    fn add_cluster_breakdown(&mut self, inventory: &Inventory, x: f32) {
        let mut y = 3.8;
        self.texts
            .push(TextMark::new("Control Plane: Free", x, y, 9.0).bold());
        y -= 0.25;

        let pools = inventory
            .clusters
            .iter()
            .flat_map(|cluster| cluster.pools.iter())
            .filter(|pool| pool.count > 0);
        for pool in pools {
            let cost = monthly_cost(&pool.pool_type) * Decimal::from(pool.count);
            self.texts.push(TextMark::new(
                format!("{}x {} workers", pool.count, pool.type_label()),
                x,
                y,
                9.0,
            ));
            y -= 0.2;
            self.texts
                .push(TextMark::new(cost_line(cost), x, y, 9.0).colored(ACCENT));
            y -= 0.3;
        }
    }

    fn add_total_panel(&mut self, total: Decimal) {
        self.panels.push(Panel {
            role: PanelRole::MonthlyTotal,
            shape: BoxMark {
                x: 2.0,
                y: 1.0,
                width: 6.0,
                height: 1.0,
                fill: LIGHT_YELLOW,
                edge: ACCENT,
                edge_px: 4,
                corner_px: 18,
            },
        });
        self.texts.push(
            TextMark::new("Current Resources Monthly Cost", 5.0, 1.7, 12.0).bold(),
        );
        self.texts.push(
            TextMark::new(format!("{}/month", format_usd(total)), 5.0, 1.3, 14.0)
                .bold()
                .colored(ACCENT),
        );
    }

    /// Categories that received a box, in layout order.
    pub fn categories(&self) -> Vec<Category> {
        self.panels
            .iter()
            .filter_map(|panel| match panel.role {
                PanelRole::Category(category) => Some(category),
                _ => None,
            })
            .collect()
    }

    pub fn has_total_panel(&self) -> bool {
        self.panels
            .iter()
            .any(|panel| panel.role == PanelRole::MonthlyTotal)
    }

    /// All text lines in drawing order.
    pub fn lines(&self) -> Vec<&str> {
        self.texts.iter().map(|mark| mark.text.as_str()).collect()
    }

    pub fn render(&self, fonts: &RasterFonts, path: &Path) -> Result<()> {
        let mut canvas = Canvas::new(WIDTH_PX, HEIGHT_PX, WIDTH_UNITS, HEIGHT_UNITS, DPI);
        for panel in &self.panels {
            canvas.draw_box(&panel.shape);
        }
        for text in &self.texts {
            canvas.draw_text(text, fonts);
        }
        canvas.save(path)
    }
}

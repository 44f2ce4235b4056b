//! Dashboard-style reports over a filtered subset.
//!
//! Four cuts of the same table: overview, products, logistics and the
//! Norte/Nordeste regional view. Each report is a serializable struct built
//! from an already-selected row set, with a plain-text `render` for the
//! terminal and JSON via the CLI's `--json` flag.

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use serde::Serialize;

use crate::dataset::OrderRecord;
use crate::format;
use crate::query::metrics;
use crate::query::period::Window;
use crate::query::regions::REGIONS;

/// Rows shown per ranking section in text output; JSON carries everything.
const RENDER_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct MonthRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekdayRevenue {
    pub weekday: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateOrders {
    pub state: String,
    pub orders: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentTypeCount {
    pub payment_type: String,
    pub rows: u64,
}

/// Headline numbers plus the time/geography/payment breakdowns.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewReport {
    pub window: Window,
    pub revenue: f64,
    pub revenue_delta_pct: Option<f64>,
    pub orders: u64,
    pub orders_delta_pct: Option<f64>,
    pub average_ticket: f64,
    pub mean_review: Option<f64>,
    pub monthly_revenue: Vec<MonthRevenue>,
    pub weekday_revenue: Vec<WeekdayRevenue>,
    pub orders_by_state: Vec<StateOrders>,
    pub payment_types: Vec<PaymentTypeCount>,
}

impl OverviewReport {
    pub fn build(rows: &[&OrderRecord], window: Window) -> Self {
        let mut monthly: BTreeMap<&str, f64> = BTreeMap::new();
        for r in rows {
            *monthly.entry(r.month_key.as_str()).or_default() += r.payment_value;
        }

        let weekday_revenue = metrics::revenue_by_weekday(rows)
            .into_iter()
            .map(|(day, revenue)| WeekdayRevenue {
                weekday: format::weekday_pt(day).to_string(),
                revenue,
            })
            .collect();

        let mut per_state: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for r in rows {
            per_state
                .entry(r.customer_state.as_str())
                .or_default()
                .insert(r.order_id.as_str());
        }
        let orders_by_state = per_state
            .into_iter()
            .map(|(state, ids)| StateOrders {
                state: state.to_string(),
                orders: ids.len() as u64,
            })
            .sorted_by(|a, b| b.orders.cmp(&a.orders))
            .collect();

        let mut payments: BTreeMap<&str, u64> = BTreeMap::new();
        for r in rows {
            *payments.entry(r.payment_type.as_str()).or_default() += 1;
        }
        let payment_types = payments
            .into_iter()
            .map(|(payment_type, rows)| PaymentTypeCount {
                payment_type: payment_type.to_string(),
                rows,
            })
            .sorted_by(|a, b| b.rows.cmp(&a.rows))
            .collect();

        Self {
            window,
            revenue: metrics::revenue(rows),
            revenue_delta_pct: None,
            orders: metrics::distinct_orders(rows),
            orders_delta_pct: None,
            average_ticket: metrics::average_ticket(rows),
            mean_review: metrics::mean_review(rows),
            monthly_revenue: monthly
                .into_iter()
                .map(|(month, revenue)| MonthRevenue {
                    month: month.to_string(),
                    revenue,
                })
                .collect(),
            weekday_revenue,
            orders_by_state,
            payment_types,
        }
    }

    /// Fill the period-over-period deltas from the preceding window's rows.
    pub fn with_previous(mut self, prev_rows: &[&OrderRecord]) -> Self {
        self.revenue_delta_pct =
            metrics::percent_delta(self.revenue, metrics::revenue(prev_rows));
        self.orders_delta_pct = metrics::percent_delta(
            self.orders as f64,
            metrics::distinct_orders(prev_rows) as f64,
        );
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "VISÃO GERAL ({} a {})\n",
            format::date_br(self.window.start),
            format::date_br(self.window.end)
        ));
        out.push_str("-----------\n");
        out.push_str(&format!(
            "Faturamento:  {}{}\n",
            format::currency(self.revenue),
            delta_suffix(self.revenue_delta_pct)
        ));
        out.push_str(&format!(
            "Pedidos:      {}{}\n",
            format::thousands(self.orders),
            delta_suffix(self.orders_delta_pct)
        ));
        out.push_str(&format!(
            "Ticket médio: {}\n",
            format::currency(self.average_ticket)
        ));
        if let Some(review) = self.mean_review {
            out.push_str(&format!("Nota média:   {}\n", format::score(review)));
        }
        out.push('\n');

        out.push_str("FATURAMENTO MENSAL\n");
        out.push_str("------------------\n");
        for m in &self.monthly_revenue {
            out.push_str(&format!("{}  {}\n", m.month, format::currency(m.revenue)));
        }
        out.push('\n');

        out.push_str("FATURAMENTO POR DIA DA SEMANA\n");
        out.push_str("-----------------------------\n");
        for d in &self.weekday_revenue {
            out.push_str(&format!(
                "{:<14} {}\n",
                d.weekday,
                format::currency(d.revenue)
            ));
        }
        out.push('\n');

        out.push_str("PEDIDOS POR ESTADO\n");
        out.push_str("------------------\n");
        for s in self.orders_by_state.iter().take(RENDER_LIMIT) {
            out.push_str(&format!("{}  {}\n", s.state, format::thousands(s.orders)));
        }
        if self.orders_by_state.len() > RENDER_LIMIT {
            out.push_str(&format!(
                "... e mais {} estados\n",
                self.orders_by_state.len() - RENDER_LIMIT
            ));
        }
        out.push('\n');

        out.push_str("FORMAS DE PAGAMENTO\n");
        out.push_str("-------------------\n");
        for p in &self.payment_types {
            out.push_str(&format!(
                "{:<14} {}\n",
                p.payment_type,
                format::thousands(p.rows)
            ));
        }
        out.trim_end().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryUnits {
    pub category: String,
    pub units: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub units: u64,
    pub revenue: f64,
    pub mean_price: f64,
}

/// Category rankings and the full portfolio table.
#[derive(Debug, Clone, Serialize)]
pub struct ProductsReport {
    pub window: Window,
    /// Top 5 categories by summed payment value.
    pub top_by_revenue: Vec<CategoryRevenue>,
    /// Top 5 categories by sold units (rows).
    pub top_by_units: Vec<CategoryUnits>,
    /// Every category with units, revenue and mean item price, by revenue.
    pub portfolio: Vec<CategoryStats>,
}

impl ProductsReport {
    pub fn build(rows: &[&OrderRecord], window: Window) -> Self {
        struct Acc {
            units: u64,
            revenue: f64,
            price_sum: f64,
        }
        let mut acc: BTreeMap<&str, Acc> = BTreeMap::new();
        for r in rows {
            if let Some(category) = r.category.as_deref() {
                let entry = acc.entry(category).or_insert(Acc {
                    units: 0,
                    revenue: 0.0,
                    price_sum: 0.0,
                });
                entry.units += 1;
                entry.revenue += r.payment_value;
                entry.price_sum += r.price;
            }
        }

        let portfolio: Vec<CategoryStats> = acc
            .into_iter()
            .map(|(category, a)| CategoryStats {
                category: category.to_string(),
                units: a.units,
                revenue: a.revenue,
                mean_price: a.price_sum / a.units as f64,
            })
            .sorted_by(|a, b| b.revenue.total_cmp(&a.revenue))
            .collect();

        let top_by_revenue = portfolio
            .iter()
            .take(5)
            .map(|c| CategoryRevenue {
                category: c.category.clone(),
                revenue: c.revenue,
            })
            .collect();
        let top_by_units = portfolio
            .iter()
            .sorted_by(|a, b| b.units.cmp(&a.units))
            .take(5)
            .map(|c| CategoryUnits {
                category: c.category.clone(),
                units: c.units,
            })
            .collect();

        Self {
            window,
            top_by_revenue,
            top_by_units,
            portfolio,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "PRODUTOS ({} a {})\n",
            format::date_br(self.window.start),
            format::date_br(self.window.end)
        ));
        out.push_str("--------\n\n");

        out.push_str("TOP 5 POR FATURAMENTO\n");
        out.push_str("---------------------\n");
        for c in &self.top_by_revenue {
            out.push_str(&format!(
                "{:<30} {}\n",
                format::category_display(&c.category),
                format::currency(c.revenue)
            ));
        }
        out.push('\n');

        out.push_str("TOP 5 POR UNIDADES\n");
        out.push_str("------------------\n");
        for c in &self.top_by_units {
            out.push_str(&format!(
                "{:<30} {}\n",
                format::category_display(&c.category),
                format::thousands(c.units)
            ));
        }
        out.push('\n');

        out.push_str(&format!("PORTFÓLIO ({} categorias)\n", self.portfolio.len()));
        out.push_str("---------\n");
        for c in self.portfolio.iter().take(RENDER_LIMIT) {
            out.push_str(&format!(
                "{:<30} {:>6} un.  {}  (preço médio {})\n",
                format::category_display(&c.category),
                format::thousands(c.units),
                format::currency(c.revenue),
                format::currency(c.mean_price)
            ));
        }
        if self.portfolio.len() > RENDER_LIMIT {
            out.push_str(&format!(
                "... e mais {} categorias\n",
                self.portfolio.len() - RENDER_LIMIT
            ));
        }
        out.trim_end().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateDays {
    pub state: String,
    pub mean_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateFreight {
    pub state: String,
    pub mean_freight: f64,
}

/// Delivery and freight picture for the subset.
#[derive(Debug, Clone, Serialize)]
pub struct LogisticsReport {
    pub window: Window,
    pub mean_delivery_days: Option<f64>,
    pub mean_freight: Option<f64>,
    pub late_rate_pct: Option<f64>,
    /// Slowest states first, top 10.
    pub delivery_by_state: Vec<StateDays>,
    /// Most expensive states first, top 10.
    pub freight_by_state: Vec<StateFreight>,
}

impl LogisticsReport {
    pub fn build(rows: &[&OrderRecord], window: Window) -> Self {
        Self {
            window,
            mean_delivery_days: metrics::mean_delivery_days(rows),
            mean_freight: metrics::mean_freight(rows),
            late_rate_pct: metrics::late_delivery_rate(rows),
            delivery_by_state: metrics::mean_delivery_by_state(rows)
                .into_iter()
                .take(RENDER_LIMIT)
                .map(|(state, mean_days)| StateDays { state, mean_days })
                .collect(),
            freight_by_state: metrics::mean_freight_by_state(rows)
                .into_iter()
                .take(RENDER_LIMIT)
                .map(|(state, mean_freight)| StateFreight {
                    state,
                    mean_freight,
                })
                .collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "LOGÍSTICA ({} a {})\n",
            format::date_br(self.window.start),
            format::date_br(self.window.end)
        ));
        out.push_str("---------\n");
        match self.mean_delivery_days {
            Some(days) => {
                out.push_str(&format!("Tempo médio de entrega: {}\n", format::days(days)))
            }
            None => out.push_str("Tempo médio de entrega: sem dados\n"),
        }
        if let Some(freight) = self.mean_freight {
            out.push_str(&format!("Frete médio:            {}\n", format::currency(freight)));
        }
        if let Some(rate) = self.late_rate_pct {
            out.push_str(&format!("Pedidos com atraso:     {}\n", format::percent(rate)));
        }
        out.push('\n');

        out.push_str("TEMPO DE ENTREGA POR ESTADO\n");
        out.push_str("---------------------------\n");
        for s in &self.delivery_by_state {
            out.push_str(&format!("{}  {}\n", s.state, format::days(s.mean_days)));
        }
        out.push('\n');

        out.push_str("FRETE MÉDIO POR ESTADO\n");
        out.push_str("----------------------\n");
        for s in &self.freight_by_state {
            out.push_str(&format!(
                "{}  {}\n",
                s.state,
                format::currency(s.mean_freight)
            ));
        }
        out.trim_end().to_string()
    }
}

/// One region's slice of the regional report.
#[derive(Debug, Clone, Serialize)]
pub struct RegionCut {
    pub region: String,
    pub orders: u64,
    pub revenue: f64,
    pub mean_delivery_days: Option<f64>,
    pub mean_freight: Option<f64>,
    pub orders_by_state: Vec<StateOrders>,
    /// Slowest states first, every state in the region.
    pub delivery_by_state: Vec<StateDays>,
    /// Most expensive states first.
    pub freight_by_state: Vec<StateFreight>,
}

/// The Norte/Nordeste expansion view.
#[derive(Debug, Clone, Serialize)]
pub struct RegionalReport {
    pub window: Window,
    pub regions: Vec<RegionCut>,
}

impl RegionalReport {
    /// Build cuts for the northern expansion regions (norte, nordeste).
    pub fn build(rows: &[&OrderRecord], window: Window) -> Self {
        let cuts = REGIONS
            .iter()
            .filter(|r| r.name == "norte" || r.name == "nordeste")
            .map(|region| {
                let cut: Vec<&OrderRecord> = rows
                    .iter()
                    .filter(|r| region.contains_state(&r.customer_state))
                    .copied()
                    .collect();

                let mut per_state: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
                for r in &cut {
                    per_state
                        .entry(r.customer_state.as_str())
                        .or_default()
                        .insert(r.order_id.as_str());
                }
                let orders_by_state = per_state
                    .into_iter()
                    .map(|(state, ids)| StateOrders {
                        state: state.to_string(),
                        orders: ids.len() as u64,
                    })
                    .sorted_by(|a, b| b.orders.cmp(&a.orders))
                    .collect();

                RegionCut {
                    region: region.display_name.to_string(),
                    orders: metrics::distinct_orders(&cut),
                    revenue: metrics::revenue(&cut),
                    mean_delivery_days: metrics::mean_delivery_days(&cut),
                    mean_freight: metrics::mean_freight(&cut),
                    orders_by_state,
                    delivery_by_state: metrics::mean_delivery_by_state(&cut)
                        .into_iter()
                        .map(|(state, mean_days)| StateDays { state, mean_days })
                        .collect(),
                    freight_by_state: metrics::mean_freight_by_state(&cut)
                        .into_iter()
                        .map(|(state, mean_freight)| StateFreight {
                            state,
                            mean_freight,
                        })
                        .collect(),
                }
            })
            .collect();
        Self {
            window,
            regions: cuts,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "EXPANSÃO NORTE/NORDESTE ({} a {})\n",
            format::date_br(self.window.start),
            format::date_br(self.window.end)
        ));
        out.push_str("-----------------------\n\n");
        for cut in &self.regions {
            out.push_str(&format!("REGIÃO {}\n", cut.region.to_uppercase()));
            out.push_str("--------\n");
            out.push_str(&format!("Pedidos:     {}\n", format::thousands(cut.orders)));
            out.push_str(&format!("Faturamento: {}\n", format::currency(cut.revenue)));
            match cut.mean_delivery_days {
                Some(days) => out.push_str(&format!(
                    "Tempo médio de entrega: {}\n",
                    format::days(days)
                )),
                None => out.push_str("Tempo médio de entrega: sem dados\n"),
            }
            if let Some(freight) = cut.mean_freight {
                out.push_str(&format!("Frete médio: {}\n", format::currency(freight)));
            }
            if !cut.orders_by_state.is_empty() {
                out.push_str("Pedidos por estado:\n");
                for s in &cut.orders_by_state {
                    out.push_str(&format!(
                        "  {}  {} pedidos\n",
                        s.state,
                        format::thousands(s.orders)
                    ));
                }
            }
            if !cut.delivery_by_state.is_empty() {
                out.push_str("Tempo de entrega por estado:\n");
                for s in &cut.delivery_by_state {
                    out.push_str(&format!("  {}  {}\n", s.state, format::days(s.mean_days)));
                }
            }
            if !cut.freight_by_state.is_empty() {
                out.push_str("Frete médio por estado:\n");
                for s in &cut.freight_by_state {
                    out.push_str(&format!(
                        "  {}  {}\n",
                        s.state,
                        format::currency(s.mean_freight)
                    ));
                }
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

fn delta_suffix(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!(" ({} vs. período anterior)", format::signed_percent(d)),
        None => String::new(),
    }
}

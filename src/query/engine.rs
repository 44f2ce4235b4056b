//! Keyword rule engine: turns a Portuguese question into an answer.
//!
//! The engine is an ordered table of rules. Each rule pairs a predicate on
//! the lowercased question with a handler that aggregates over the working
//! subset; the first matching rule answers. Region mentions narrow the
//! subset before any rule runs, and the resolved period binds it to a date
//! window. Unknown questions fall through to a help answer.
//!
//! Handlers never panic on thin data: empty subsets and all-missing columns
//! come back as the canned "no data" answers.
//!
//! # Example
//!
//! ```ignore
//! use botdash::query::engine::{answer, QueryOptions};
//!
//! let window = data.date_range().unwrap();
//! let ans = answer(&data, "Qual o faturamento em maio de 2018?", window);
//! println!("{}", ans.text);
//! ```

use serde::Serialize;
use tracing::debug;

use crate::dataset::{Dataset, OrderRecord, RecordFilter};
use crate::format;
use crate::query::metrics;
use crate::query::period::{self, ResolvedWindow, Window};
use crate::query::regions::{self, Region};

const NO_PERIOD_DATA: &str = "Não encontrei dados para o período selecionado.";
const NO_SUMMARY_DATA: &str = "Não há dados no período para gerar um resumo.";
const NO_PRODUCT_DATA: &str = "Não há vendas de produtos no período para analisar.";
const NO_DELIVERY_DATA: &str = "Não há dados de entrega para analisar.";
const NO_REVIEW_DATA: &str = "Não há avaliações no período para analisar.";

const HELP_TEXT: &str = "🤔 Não entendi sua pergunta. Tente algo como:\n\
• \"Qual o resumo do período?\"\n\
• \"Qual o faturamento em maio de 2018?\"\n\
• \"Qual o produto mais vendido?\"\n\
• \"Qual o ticket médio?\"\n\
• \"Qual dia da semana vende mais?\"\n\
• \"Qual o tempo médio de entrega?\"\n\
• \"Qual o frete médio?\"\n\
• \"Qual estado tem a entrega mais demorada?\"\n\
• \"Qual o percentual de pedidos com atraso?\"\n\
• \"Os clientes estão satisfeitos?\"\n\
• \"Quantos pedidos tivemos no período?\"\n\
• \"Quantos clientes únicos temos?\"";

/// Raw numeric payload of an answer, for JSON output and programmatic use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricValue {
    Currency { amount: f64 },
    Days { days: f64 },
    Percent { percent: f64 },
    Count { count: u64 },
    Score { score: f64 },
    Category { category: String, rows: usize },
    Weekday { weekday: String },
    StateDelivery { state: String, days: f64 },
    Summary(PeriodSummary),
}

/// Numbers behind the "resumo" answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub revenue: f64,
    /// Percent change vs. the previous period; None when that period had
    /// no revenue to compare against.
    pub revenue_delta_pct: Option<f64>,
    pub orders: u64,
    pub orders_delta_pct: Option<f64>,
    pub top_category: Option<String>,
    pub slowest_state: Option<SlowestState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowestState {
    pub state: String,
    pub mean_days: f64,
}

/// One answered question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    /// The window the answer was computed over.
    pub window: Window,
    /// True when the period was named in the question text.
    pub period_from_question: bool,
    /// Display name of the region filter, when one applied.
    pub region: Option<String>,
    /// Name of the rule that answered; None for help and region-empty
    /// answers.
    pub rule: Option<&'static str>,
    pub value: Option<MetricValue>,
}

/// Optional restrictions beyond the question text.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions<'a> {
    /// Apply this region as if the question had named it.
    pub forced_region: Option<&'static Region>,
    /// Restrict to one seller's orders (seller portal cut).
    pub seller: Option<&'a str>,
}

/// Everything a rule handler can see.
struct RuleContext<'a> {
    dataset: &'a Dataset,
    window: Window,
    region: Option<&'static Region>,
    seller: Option<&'a str>,
    rows: Vec<&'a OrderRecord>,
}

struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    answer: fn(&RuleContext<'_>) -> (String, Option<MetricValue>),
}

/// The rule chain. Order is load-bearing: earlier rules win, so the
/// specific phrasings sit above the generic ones ("atraso" above "pedidos",
/// the weekday rule above "vendas").
const RULES: [Rule; 12] = [
    Rule {
        name: "resumo",
        matches: wants_summary,
        answer: answer_summary,
    },
    Rule {
        name: "produto_mais_vendido",
        matches: wants_top_product,
        answer: answer_top_product,
    },
    Rule {
        name: "ticket_medio",
        matches: wants_average_ticket,
        answer: answer_average_ticket,
    },
    Rule {
        name: "melhor_dia_da_semana",
        matches: wants_best_weekday,
        answer: answer_best_weekday,
    },
    Rule {
        name: "tempo_de_entrega",
        matches: wants_delivery_time,
        answer: answer_delivery_time,
    },
    Rule {
        name: "frete_medio",
        matches: wants_freight,
        answer: answer_freight,
    },
    Rule {
        name: "entrega_mais_demorada",
        matches: wants_slowest_state,
        answer: answer_slowest_state,
    },
    Rule {
        name: "atraso",
        matches: wants_late_rate,
        answer: answer_late_rate,
    },
    Rule {
        name: "satisfacao",
        matches: wants_review,
        answer: answer_review,
    },
    Rule {
        name: "pedidos",
        matches: wants_order_count,
        answer: answer_order_count,
    },
    Rule {
        name: "faturamento",
        matches: wants_revenue,
        answer: answer_revenue,
    },
    Rule {
        name: "clientes_unicos",
        matches: wants_unique_customers,
        answer: answer_unique_customers,
    },
];

/// Answer a question over the dataset, using `ui_window` when the text
/// names no period.
pub fn answer(dataset: &Dataset, question: &str, ui_window: Window) -> Answer {
    answer_with(dataset, question, ui_window, &QueryOptions::default())
}

/// [`answer`] with extra restrictions (forced region, seller cut).
pub fn answer_with(
    dataset: &Dataset,
    question: &str,
    ui_window: Window,
    opts: &QueryOptions<'_>,
) -> Answer {
    let normalized = question.to_lowercase();
    let resolved = period::resolve(&normalized, ui_window);
    let region = opts.forced_region.or_else(|| regions::match_region(&normalized));

    let mut filter = RecordFilter::window(resolved.window);
    if let Some(region) = region {
        filter = filter.with_states(region.states);
    }
    if let Some(seller) = opts.seller {
        filter = filter.with_seller(seller);
    }
    let rows = dataset.select(&filter);

    if let Some(region) = region {
        if rows.is_empty() {
            return finish(
                region_no_data(region),
                resolved,
                Some(region),
                None,
                None,
            );
        }
    }

    let Some(rule) = RULES.iter().find(|r| (r.matches)(&normalized)) else {
        return finish(HELP_TEXT.to_string(), resolved, region, None, None);
    };
    debug!(rule = rule.name, rows = rows.len(), "matched rule");

    if rows.is_empty() {
        let text = if rule.name == "resumo" {
            NO_SUMMARY_DATA
        } else {
            NO_PERIOD_DATA
        };
        return finish(text.to_string(), resolved, region, Some(rule.name), None);
    }

    let ctx = RuleContext {
        dataset,
        window: resolved.window,
        region,
        seller: opts.seller,
        rows,
    };
    let (text, value) = (rule.answer)(&ctx);
    finish(text, resolved, region, Some(rule.name), value)
}

fn finish(
    text: String,
    resolved: ResolvedWindow,
    region: Option<&'static Region>,
    rule: Option<&'static str>,
    value: Option<MetricValue>,
) -> Answer {
    Answer {
        text,
        window: resolved.window,
        period_from_question: resolved.from_question,
        region: region.map(|r| r.display_name.to_string()),
        rule,
        value,
    }
}

fn region_no_data(region: &Region) -> String {
    format!(
        "Não encontrei dados para a região {} no período selecionado.",
        region.display_name
    )
}

fn wants_summary(q: &str) -> bool {
    q.contains("resumo")
}

fn wants_top_product(q: &str) -> bool {
    q.contains("produto mais vendido")
}

fn wants_average_ticket(q: &str) -> bool {
    q.contains("ticket médio") || q.contains("ticket medio")
}

fn wants_best_weekday(q: &str) -> bool {
    q.contains("dia da semana") && q.contains("vende mais")
}

fn wants_delivery_time(q: &str) -> bool {
    q.contains("entrega") && q.contains("tempo")
}

fn wants_freight(q: &str) -> bool {
    q.contains("frete")
}

fn wants_slowest_state(q: &str) -> bool {
    q.contains("entrega mais demorada")
}

fn wants_late_rate(q: &str) -> bool {
    q.contains("atraso")
}

fn wants_review(q: &str) -> bool {
    q.contains("satisfeitos") || q.contains("nota média") || q.contains("review")
}

fn wants_order_count(q: &str) -> bool {
    q.contains("pedidos") || q.contains("vendas")
}

fn wants_revenue(q: &str) -> bool {
    q.contains("faturamento")
}

fn wants_unique_customers(q: &str) -> bool {
    q.contains("cliente") && (q.contains("único") || q.contains("unico"))
}

fn answer_summary(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    let revenue = metrics::revenue(&ctx.rows);
    let orders = metrics::distinct_orders(&ctx.rows);

    // Previous period under the same region/seller cut, so the comparison
    // is like for like.
    let mut prev_filter = RecordFilter::window(ctx.window.previous());
    if let Some(region) = ctx.region {
        prev_filter = prev_filter.with_states(region.states);
    }
    if let Some(seller) = ctx.seller {
        prev_filter = prev_filter.with_seller(seller);
    }
    let prev_rows = ctx.dataset.select(&prev_filter);
    let revenue_delta = metrics::percent_delta(revenue, metrics::revenue(&prev_rows));
    let orders_delta = metrics::percent_delta(
        orders as f64,
        metrics::distinct_orders(&prev_rows) as f64,
    );

    let top = metrics::top_category(&ctx.rows);
    let slowest = metrics::slowest_state(&ctx.rows);

    let champion = top
        .as_ref()
        .map(|(category, _)| format::category_display(category))
        .unwrap_or_else(|| "N/A".to_string());

    let mut text = format!(
        "🤖 Resumo do período ({} a {})\n\n",
        format::date_br_short(ctx.window.start),
        format::date_br_short(ctx.window.end),
    );
    text.push_str(&format!(
        "• Faturamento: {}{}\n",
        format::currency(revenue),
        delta_clause(revenue_delta),
    ));
    text.push_str(&format!(
        "• Pedidos: {}{}\n",
        format::thousands(orders),
        delta_clause(orders_delta),
    ));
    text.push_str(&format!("• Produto campeão: categoria \"{}\"\n", champion));
    if let Some((state, days)) = &slowest {
        text.push_str(&format!(
            "• Ponto de atenção: maior tempo médio de entrega no estado {} ({})\n",
            state,
            format::days(*days),
        ));
    }

    let value = MetricValue::Summary(PeriodSummary {
        revenue,
        revenue_delta_pct: revenue_delta,
        orders,
        orders_delta_pct: orders_delta,
        top_category: top.map(|(category, _)| category),
        slowest_state: slowest.map(|(state, mean_days)| SlowestState { state, mean_days }),
    });
    (text.trim_end().to_string(), Some(value))
}

fn delta_clause(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!(" ({} vs. período anterior)", format::signed_percent(d)),
        None => String::new(),
    }
}

fn answer_top_product(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::top_category(&ctx.rows) {
        Some((category, rows)) => (
            format!(
                "🏆 Seu produto mais vendido no período foi {}.",
                format::category_display(&category),
            ),
            Some(MetricValue::Category { category, rows }),
        ),
        None => (NO_PRODUCT_DATA.to_string(), None),
    }
}

fn answer_average_ticket(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    let ticket = metrics::average_ticket(&ctx.rows);
    (
        format!(
            "O ticket médio por pedido no período foi de {}.",
            format::currency(ticket),
        ),
        Some(MetricValue::Currency { amount: ticket }),
    )
}

fn answer_best_weekday(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::best_weekday(&ctx.rows) {
        Some(day) => {
            let weekday = format::weekday_pt(day);
            (
                format!("O dia da semana com maior faturamento foi {}.", weekday),
                Some(MetricValue::Weekday {
                    weekday: weekday.to_string(),
                }),
            )
        }
        None => (NO_PERIOD_DATA.to_string(), None),
    }
}

fn answer_delivery_time(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::mean_delivery_days(&ctx.rows) {
        Some(days) => {
            let text = match ctx.region {
                Some(region) => format!(
                    "📦 Tempo médio de entrega na região {}: {}",
                    region.display_name,
                    format::days(days),
                ),
                None => format!(
                    "📦 O tempo médio de entrega no período foi de {}.",
                    format::days(days),
                ),
            };
            (text, Some(MetricValue::Days { days }))
        }
        None => (no_delivery_data(ctx), None),
    }
}

fn answer_freight(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::mean_freight(&ctx.rows) {
        Some(freight) => {
            let text = match ctx.region {
                Some(region) => format!(
                    "🚚 Frete médio na região {}: {}",
                    region.display_name,
                    format::currency(freight),
                ),
                None => format!(
                    "🚚 O frete médio no período foi de {}.",
                    format::currency(freight),
                ),
            };
            (text, Some(MetricValue::Currency { amount: freight }))
        }
        None => (NO_PERIOD_DATA.to_string(), None),
    }
}

fn answer_slowest_state(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::slowest_state(&ctx.rows) {
        Some((state, days)) => (
            format!(
                "O estado com a maior média de tempo de entrega é {}, com {}.",
                state,
                format::days(days),
            ),
            Some(MetricValue::StateDelivery { state, days }),
        ),
        None => (no_delivery_data(ctx), None),
    }
}

fn answer_late_rate(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::late_delivery_rate(&ctx.rows) {
        Some(rate) => {
            let text = match ctx.region {
                Some(region) => format!(
                    "⏰ Percentual de pedidos com atraso na região {}: {}",
                    region.display_name,
                    format::percent(rate),
                ),
                None => format!(
                    "⏰ O percentual de pedidos com atraso no período foi de {}.",
                    format::percent(rate),
                ),
            };
            (text, Some(MetricValue::Percent { percent: rate }))
        }
        None => (no_delivery_data(ctx), None),
    }
}

fn answer_review(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    match metrics::mean_review(&ctx.rows) {
        Some(score) => {
            let tier = if score > 4.0 {
                "É uma ótima nota!"
            } else if score > 3.0 {
                "É uma boa nota, mas há espaço para melhorar."
            } else {
                "Ponto de atenção! A satisfação pode ser melhorada."
            };
            (
                format!(
                    "⭐ A nota média de satisfação dos seus clientes é {} de 5. {}",
                    format::score(score),
                    tier,
                ),
                Some(MetricValue::Score { score }),
            )
        }
        None => (NO_REVIEW_DATA.to_string(), None),
    }
}

fn answer_order_count(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    let count = metrics::distinct_orders(&ctx.rows);
    let text = match ctx.region {
        Some(region) => format!(
            "🛒 Total de pedidos na região {}: {}",
            region.display_name,
            format::thousands(count),
        ),
        None => format!(
            "🛒 Foram feitos {} pedidos no período.",
            format::thousands(count),
        ),
    };
    (text, Some(MetricValue::Count { count }))
}

fn answer_revenue(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    let total = metrics::revenue(&ctx.rows);
    (
        format!(
            "💰 O faturamento total no período foi de {}.",
            format::currency(total),
        ),
        Some(MetricValue::Currency { amount: total }),
    )
}

fn answer_unique_customers(ctx: &RuleContext<'_>) -> (String, Option<MetricValue>) {
    let count = metrics::distinct_customers(&ctx.rows);
    (
        format!("👤 Clientes únicos no período: {}", format::thousands(count)),
        Some(MetricValue::Count { count }),
    )
}

/// Delivery metrics without a single delivered row: under a region the
/// whole regional cut is unanalyzable, so the region message applies.
fn no_delivery_data(ctx: &RuleContext<'_>) -> String {
    match ctx.region {
        Some(region) => region_no_data(region),
        None => NO_DELIVERY_DATA.to_string(),
    }
}

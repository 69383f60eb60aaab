//! Turns a finished questionnaire into chat text and a downloadable report.

use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use tax_core::TerminalOutcome;
use tax_core::calculations::common::round_half_up;

/// A generated document, built in memory and handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub file_name: String,
    pub contents: String,
}

/// Formats an amount as `R$ 1234.56`, rounded half-up to cents.
pub fn format_brl(value: Decimal) -> String {
    let mut rounded = round_half_up(value);
    rounded.rescale(2);
    format!("R$ {rounded}")
}

/// Formats a rate such as `0.075` as `7.5%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

/// Short chat reply sent alongside the document.
pub fn summary(outcome: &TerminalOutcome) -> String {
    let input = &outcome.input;
    let result = &outcome.result;

    format!(
        "📊 **Cálculo do Imposto de Renda**\n\
         🧑‍💼 Renda anual: **{}**\n\
         👨‍👩‍👧 Dependentes: **{}**\n\
         🏦 INSS: **{}**\n\
         🧾 Outras deduções: **{}**\n\n\
         📉 Base de cálculo: **{}**\n\
         💵 Imposto devido: **{}**\n\
         📅 Retenção mensal estimada: **{}**",
        format_brl(input.annual_income),
        input.dependents,
        format_brl(input.inss_paid),
        format_brl(input.other_deductions),
        format_brl(result.annual_taxable_base),
        format_brl(result.annual_tax),
        format_brl(result.monthly_withholding),
    )
}

/// Full Markdown report.
pub fn render(
    outcome: &TerminalOutcome,
    generated_at: DateTime<Local>,
) -> ReportDocument {
    let input = &outcome.input;
    let result = &outcome.result;

    let mut out = String::from("# Estimativa do Imposto de Renda\n\n");
    out.push_str(&format!("Gerado em {}\n", generated_at.format("%d/%m/%Y %H:%M")));

    push_table(
        &mut out,
        "Dados informados",
        &[
            ("Renda anual", format_brl(input.annual_income)),
            ("Dependentes", input.dependents.to_string()),
            ("INSS pago no ano", format_brl(input.inss_paid)),
            ("Outras deduções", format_brl(input.other_deductions)),
        ],
    );
    push_table(
        &mut out,
        "Anual",
        &[
            ("Base de cálculo", format_brl(result.annual_taxable_base)),
            ("Alíquota da faixa", format_rate(result.annual_marginal_rate)),
            ("Imposto devido", format_brl(result.annual_tax)),
        ],
    );
    push_table(
        &mut out,
        "Mensal",
        &[
            ("Base de cálculo", format_brl(result.monthly_taxable_base)),
            ("Alíquota da faixa", format_rate(result.monthly_marginal_rate)),
            ("Retenção estimada", format_brl(result.monthly_withholding)),
        ],
    );

    ReportDocument {
        file_name: format!("imposto-de-renda-{}.md", sanitize_file_stem(outcome.user_id.as_str())),
        contents: out,
    }
}

fn push_table(
    out: &mut String,
    heading: &str,
    rows: &[(&str, String)],
) {
    out.push_str(&format!("\n## {heading}\n\n| Item | Valor |\n|---|---|\n"));
    for (label, value) in rows {
        out.push_str(&format!("| {label} | {value} |\n"));
    }
}

/// Keeps letters, digits, `-` and `_`; everything else becomes `_`.
fn sanitize_file_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{TaxComputationInput, TaxComputationResult, UserId};

    use super::*;

    fn outcome() -> TerminalOutcome {
        TerminalOutcome {
            user_id: UserId::new("1234"),
            input: TaxComputationInput {
                annual_income: dec!(85000),
                dependents: 2,
                inss_paid: dec!(6000),
                other_deductions: dec!(0),
            },
            result: TaxComputationResult {
                annual_taxable_base: dec!(74449.84),
                annual_tax: dec!(10041.39),
                monthly_taxable_base: dec!(6204.15),
                monthly_withholding: dec!(810.14),
                annual_marginal_rate: dec!(0.275),
                monthly_marginal_rate: dec!(0.275),
            },
        }
    }

    #[test]
    fn format_brl_pads_to_cents() {
        assert_eq!(format_brl(dec!(85000)), "R$ 85000.00");
        assert_eq!(format_brl(dec!(0.5)), "R$ 0.50");
    }

    #[test]
    fn format_brl_rounds_half_up() {
        assert_eq!(format_brl(dec!(10041.385)), "R$ 10041.39");
        assert_eq!(format_brl(dec!(10041.384)), "R$ 10041.38");
    }

    #[test]
    fn format_brl_keeps_sign_of_negative_base() {
        assert_eq!(format_brl(dec!(-4000)), "R$ -4000.00");
    }

    #[test]
    fn format_rate_drops_trailing_zeros() {
        assert_eq!(format_rate(dec!(0.075)), "7.5%");
        assert_eq!(format_rate(dec!(0.275)), "27.5%");
        assert_eq!(format_rate(dec!(0)), "0%");
    }

    #[test]
    fn summary_lists_answers_and_tax() {
        let text = summary(&outcome());

        assert!(text.contains("Renda anual: **R$ 85000.00**"));
        assert!(text.contains("Dependentes: **2**"));
        assert!(text.contains("Base de cálculo: **R$ 74449.84**"));
        assert!(text.contains("Imposto devido: **R$ 10041.39**"));
        assert!(text.contains("Retenção mensal estimada: **R$ 810.14**"));
    }

    #[test]
    fn render_builds_markdown_document() {
        let generated_at = Local.with_ymd_and_hms(2024, 4, 30, 9, 15, 0).unwrap();

        let doc = render(&outcome(), generated_at);

        assert_eq!(doc.file_name, "imposto-de-renda-1234.md");
        assert!(doc.contents.starts_with("# Estimativa do Imposto de Renda"));
        assert!(doc.contents.contains("Gerado em 30/04/2024 09:15"));
        assert!(doc.contents.contains("| Alíquota da faixa | 27.5% |"));
        assert!(doc.contents.contains("| Retenção estimada | R$ 810.14 |"));
    }

    #[test]
    fn render_sanitizes_user_id_in_file_name() {
        let mut outcome = outcome();
        outcome.user_id = UserId::new("ana/../x");

        let doc = render(&outcome, Local::now());

        assert_eq!(doc.file_name, "imposto-de-renda-ana____x.md");
    }
}

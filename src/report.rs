use std::fmt::Write;

use crate::models::{AbsenceAlert, PeriodReport};

/// Plain-text block for one period, in the wording the dispatch team
/// shares over chat. Every number comes straight from the report struct.
pub fn render_period_report(report: &PeriodReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} – {}", report.courier_name, report.period_label);
    let _ = writeln!(output);
    let _ = writeln!(output, "Dias esperados: {}", report.expected_days);
    let _ = writeln!(output, "Presenças: {}", report.presences);
    let _ = writeln!(output, "Faltas: {}", report.absences);
    let _ = writeln!(output, "Tempo online: {:.1}%", report.online_pct);
    let _ = writeln!(output, "Turnos realizados: {}", report.shifts);
    let _ = writeln!(output, "Corridas:");
    let _ = writeln!(output, " • Ofertadas: {}", report.offered);
    let _ = writeln!(
        output,
        " • Aceitas: {} ({:.1}%)",
        report.accepted, report.accept_rate
    );
    let _ = writeln!(
        output,
        " • Rejeitadas: {} ({:.1}%)",
        report.rejected, report.reject_rate
    );
    let _ = writeln!(
        output,
        " • Completas: {} ({:.1}%)",
        report.completed, report.completion_rate
    );

    output
}

/// Concatenates period blocks in order, separated by a blank line.
pub fn render_period_reports(reports: &[PeriodReport]) -> String {
    reports
        .iter()
        .map(render_period_report)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One bullet per flagged courier.
pub fn render_alerts(alerts: &[AbsenceAlert]) -> String {
    let mut output = String::new();
    for alert in alerts {
        let last = match alert.last_presence {
            Some(date) => format!("última presença: {}", date.format("%d/%m")),
            None => "sem presença na janela".to_string(),
        };
        let _ = writeln!(
            output,
            "• {} – {} dias consecutivos ausente ({})",
            alert.courier_name, alert.run_length, last
        );
    }
    output
}

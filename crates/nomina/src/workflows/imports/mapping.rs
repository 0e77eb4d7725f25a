use std::collections::HashMap;
use std::sync::OnceLock;

use crate::workflows::normalize_token;
use crate::workflows::prenomina::IncidenceCategory;

static CATEGORY_ALIASES: OnceLock<HashMap<&'static str, IncidenceCategory>> = OnceLock::new();

/// Resolves a category label from a time-clock or HR export. Canonical names are
/// tried first, then the Spanish labels used on attendance sheets.
pub(crate) fn category_for(value: &str) -> Option<IncidenceCategory> {
    if let Ok(category) = value.parse::<IncidenceCategory>() {
        return Some(category);
    }
    category_aliases()
        .get(normalize_token(value).as_str())
        .copied()
}

fn category_aliases() -> &'static HashMap<&'static str, IncidenceCategory> {
    CATEGORY_ALIASES.get_or_init(|| {
        const LABELS: &[(&str, IncidenceCategory)] = &[
            ("falta", IncidenceCategory::Absence),
            ("inasistencia", IncidenceCategory::Absence),
            ("incapacidad", IncidenceCategory::Sick),
            ("vacaciones", IncidenceCategory::Vacation),
            ("permiso_sin_goce", IncidenceCategory::UnpaidLeave),
            ("asistencia", IncidenceCategory::Attendance),
            ("dias_trabajados", IncidenceCategory::Attendance),
            ("horas_extra", IncidenceCategory::Overtime),
            ("tiempo_extra", IncidenceCategory::Overtime),
            ("retardo", IncidenceCategory::Delay),
            ("salida_anticipada", IncidenceCategory::EarlyDeparture),
            ("bono", IncidenceCategory::Bonus),
            ("comision", IncidenceCategory::Commission),
            ("otro_ingreso", IncidenceCategory::OtherIncome),
            ("descuento", IncidenceCategory::Deduction),
            ("prestamo", IncidenceCategory::Loan),
            ("anticipo", IncidenceCategory::Advance),
        ];
        LABELS.iter().copied().collect()
    })
}

#[cfg(test)]
pub(crate) fn lookup_for_tests(value: &str) -> Option<IncidenceCategory> {
    category_for(value)
}

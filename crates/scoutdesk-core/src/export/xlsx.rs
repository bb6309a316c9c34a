use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::DocumentRenderer;
use crate::budget::BudgetSummary;
use crate::models::{ActividadExterior, CompraRegistro, Dirigente, ItemPresupuesto, Patrulla, Scout};
use crate::template::{FilledDocument, TemplateError};
use crate::utils::format_date;

const MONEY_FORMAT: &str = "#,##0.00";
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// One spreadsheet cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetValue {
    Text(String),
    Number(f64),
    Money(f64),
    Empty,
}

impl From<&str> for SheetValue {
    fn from(s: &str) -> Self {
        SheetValue::Text(s.to_string())
    }
}

impl From<String> for SheetValue {
    fn from(s: String) -> Self {
        SheetValue::Text(s)
    }
}

impl From<Option<&str>> for SheetValue {
    fn from(s: Option<&str>) -> Self {
        match s {
            Some(s) if !s.is_empty() => SheetValue::Text(s.to_string()),
            _ => SheetValue::Empty,
        }
    }
}

fn xlsx_error(e: XlsxError) -> TemplateError {
    TemplateError::Render {
        format: "xlsx",
        message: e.to_string(),
    }
}

/// Spreadsheet exports: list sheets and form sheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxExporter;

impl XlsxExporter {
    /// Write a bold header row followed by `rows`, sizing columns to content.
    fn write_table(
        sheet: &mut Worksheet,
        headers: &[&str],
        rows: &[Vec<SheetValue>],
    ) -> Result<(), XlsxError> {
        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format(MONEY_FORMAT);
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

        for (col, header) in headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }

        for (r, row) in rows.iter().enumerate() {
            let line = (r + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                let c = col as u16;
                let len = match value {
                    SheetValue::Text(text) => {
                        sheet.write_string(line, c, text.as_str())?;
                        text.chars().count()
                    }
                    SheetValue::Number(n) => {
                        sheet.write_number(line, c, *n)?;
                        n.to_string().len()
                    }
                    SheetValue::Money(n) => {
                        sheet.write_number_with_format(line, c, *n, &money)?;
                        format!("{:.2}", n).len() + 2
                    }
                    SheetValue::Empty => 0,
                };
                if let Some(w) = widths.get_mut(col) {
                    *w = (*w).max(len);
                }
            }
        }

        for (col, width) in widths.iter().enumerate() {
            let width = (*width as f64 + 2.0).min(MAX_COLUMN_WIDTH);
            sheet.set_column_width(col as u16, width)?;
        }

        Ok(())
    }

    fn single_sheet(
        name: &str,
        headers: &[&str],
        rows: &[Vec<SheetValue>],
    ) -> Result<Vec<u8>, TemplateError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(xlsx_error)?;
        Self::write_table(sheet, headers, rows).map_err(xlsx_error)?;
        workbook.save_to_buffer().map_err(xlsx_error)
    }

    /// Scout roster, one row per scout.
    pub fn scouts(
        &self,
        scouts: &[Scout],
        patrullas: &[Patrulla],
        today: NaiveDate,
    ) -> Result<Vec<u8>, TemplateError> {
        let headers = [
            "Apellidos", "Nombres", "Documento", "Nacimiento", "Edad", "Rama", "Patrulla",
            "Estado", "Celular", "Email",
        ];
        let rows: Vec<Vec<SheetValue>> = scouts
            .iter()
            .map(|s| -> Vec<SheetValue> {
                let patrulla = s
                    .patrulla_id
                    .and_then(|id| patrullas.iter().find(|p| p.id == Some(id)))
                    .map(|p| p.nombre.as_str());
                vec![
                    s.apellidos.as_str().into(),
                    s.nombres.as_str().into(),
                    s.numero_documento.as_deref().into(),
                    format_date(s.fecha_nacimiento).into(),
                    s.edad(today)
                        .map(|e| SheetValue::Number(f64::from(e)))
                        .unwrap_or(SheetValue::Empty),
                    s.rama.label().into(),
                    patrulla.into(),
                    s.estado.label().into(),
                    s.contact_phone().into(),
                    s.email.as_deref().into(),
                ]
            })
            .collect();
        Self::single_sheet("Scouts", &headers, &rows)
    }

    /// Leader roster, one row per dirigente.
    pub fn dirigentes(&self, dirigentes: &[Dirigente]) -> Result<Vec<u8>, TemplateError> {
        let headers = [
            "Apellidos", "Nombres", "Documento", "Cargo", "Rama", "Formación", "Estado",
            "Celular", "Email",
        ];
        let rows: Vec<Vec<SheetValue>> = dirigentes
            .iter()
            .map(|d| -> Vec<SheetValue> {
                vec![
                    d.apellidos.as_str().into(),
                    d.nombres.as_str().into(),
                    d.numero_documento.as_str().into(),
                    d.cargo_display().into(),
                    d.rama.map(|r| r.label()).into(),
                    d.nivel_formacion.as_deref().into(),
                    d.estado.label().into(),
                    d.celular.as_deref().into(),
                    d.email.as_deref().into(),
                ]
            })
            .collect();
        Self::single_sheet("Dirigentes", &headers, &rows)
    }

    /// Activity budget: line items, purchases and a summary sheet.
    pub fn budget(
        &self,
        actividad: &ActividadExterior,
        items: &[ItemPresupuesto],
        compras: &[CompraRegistro],
    ) -> Result<Vec<u8>, TemplateError> {
        let summary = BudgetSummary::compute(actividad, items, compras);
        let items: Vec<&ItemPresupuesto> =
            items.iter().filter(|i| Some(i.actividad_id) == actividad.id).collect();
        let compras: Vec<&CompraRegistro> =
            compras.iter().filter(|c| Some(c.actividad_id) == actividad.id).collect();

        let item_rows: Vec<Vec<SheetValue>> = items
            .iter()
            .map(|i| -> Vec<SheetValue> {
                vec![
                    i.categoria.label().into(),
                    i.descripcion.as_str().into(),
                    SheetValue::Number(i.cantidad),
                    i.unidad.as_deref().into(),
                    SheetValue::Money(i.precio_unitario),
                    i.dias_alquiler
                        .filter(|d| *d > 0)
                        .map(|d| SheetValue::Number(f64::from(d)))
                        .unwrap_or(SheetValue::Empty),
                    SheetValue::Money(i.subtotal()),
                    SheetValue::from(if i.comprado { "Sí" } else { "No" }),
                ]
            })
            .collect();

        let compra_rows: Vec<Vec<SheetValue>> = compras
            .iter()
            .map(|c| -> Vec<SheetValue> {
                vec![
                    format_date(c.fecha).into(),
                    c.descripcion.as_str().into(),
                    c.proveedor.as_deref().into(),
                    SheetValue::Money(c.monto),
                    c.comprobante_url.as_deref().into(),
                ]
            })
            .collect();

        let cents = |c: i64| SheetValue::Money(c as f64 / 100.0);
        let mut summary_rows: Vec<Vec<SheetValue>> = summary
            .by_category
            .iter()
            .map(|c| -> Vec<SheetValue> {
                vec![
                    c.categoria.label().into(),
                    cents(c.cents),
                    SheetValue::Number((c.percent * 10.0).round() / 10.0),
                ]
            })
            .collect();
        summary_rows.push(vec!["Total".into(), cents(summary.total_cents), SheetValue::Number(100.0)]);
        summary_rows.push(vec![
            "Ejecutado".into(),
            cents(summary.executed_cents),
            SheetValue::Number((summary.execution_percent * 10.0).round() / 10.0),
        ]);
        summary_rows.push(vec!["Saldo".into(), cents(summary.remaining_cents), SheetValue::Empty]);
        if let Some(per_head) = summary.cost_per_participant_cents {
            summary_rows.push(vec!["Costo por participante".into(), cents(per_head), SheetValue::Empty]);
        }

        let build = || -> Result<Vec<u8>, XlsxError> {
            let mut workbook = Workbook::new();

            let sheet = workbook.add_worksheet();
            sheet.set_name("Presupuesto")?;
            Self::write_table(
                sheet,
                &["Categoría", "Descripción", "Cantidad", "Unidad", "P. unitario", "Días", "Subtotal", "Comprado"],
                &item_rows,
            )?;

            let sheet = workbook.add_worksheet();
            sheet.set_name("Compras")?;
            Self::write_table(sheet, &["Fecha", "Descripción", "Proveedor", "Monto", "Comprobante"], &compra_rows)?;

            let sheet = workbook.add_worksheet();
            sheet.set_name("Resumen")?;
            Self::write_table(sheet, &["Concepto", "Monto", "%"], &summary_rows)?;

            workbook.save_to_buffer()
        };
        build().map_err(xlsx_error)
    }

    /// `presupuesto_<actividad>.xlsx`
    pub fn budget_file_name(actividad: &ActividadExterior) -> String {
        let slug: String = actividad
            .nombre
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        format!("presupuesto_{}.xlsx", slug)
    }
}

impl DocumentRenderer for XlsxExporter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    /// One worksheet row per template row, spanning cells merged.
    fn render(&self, document: &FilledDocument) -> Result<Vec<u8>, TemplateError> {
        let build = || -> Result<Vec<u8>, XlsxError> {
            let mut workbook = Workbook::new();
            let sheet = workbook.add_worksheet();
            sheet.set_name(document.code.as_str())?;

            let bold = Format::new().set_bold();
            sheet.write_string_with_format(0, 0, document.title.as_str(), &bold)?;
            let mut line: u32 = 1;
            if let Some(subtitle) = &document.subtitle {
                sheet.write_string(line, 0, subtitle.as_str())?;
                line += 1;
            }
            line += 1;

            for row in &document.rows {
                let mut col: u16 = 0;
                for cell in &row.cells {
                    let span = cell.col_span.max(1) as u16;
                    let format = if cell.is_header { bold.clone() } else { Format::new() };
                    if span > 1 {
                        sheet.merge_range(line, col, line, col + span - 1, cell.text.as_str(), &format)?;
                    } else {
                        sheet.write_string_with_format(line, col, cell.text.as_str(), &format)?;
                    }
                    col += span;
                }
                line += 1;
            }

            for col in 0..document.grid_columns as u16 {
                sheet.set_column_width(col, 24.0)?;
            }
            workbook.save_to_buffer()
        };
        build().map_err(xlsx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rama;

    fn is_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(b"PK")
    }

    #[test]
    fn test_scouts_workbook() {
        let scouts = vec![Scout {
            nombres: "Ana".to_string(),
            apellidos: "Vega".to_string(),
            rama: Rama::Manada,
            patrulla_id: Some(1),
            ..Default::default()
        }];
        let patrullas = vec![Patrulla {
            id: Some(1),
            nombre: "Lobos".to_string(),
            ..Default::default()
        }];
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
        let bytes = XlsxExporter.scouts(&scouts, &patrullas, today).expect("scouts xlsx");
        assert!(is_zip(&bytes));
    }

    #[test]
    fn test_budget_workbook_and_file_name() {
        let actividad = ActividadExterior {
            id: Some(1),
            nombre: "Campamento Huampaní 2024".to_string(),
            ..Default::default()
        };
        let items = vec![ItemPresupuesto {
            actividad_id: 1,
            descripcion: "Carpas".to_string(),
            cantidad: 4.0,
            precio_unitario: 25.0,
            dias_alquiler: Some(3),
            ..Default::default()
        }];
        let bytes = XlsxExporter.budget(&actividad, &items, &[]).expect("budget xlsx");
        assert!(is_zip(&bytes));
        assert_eq!(
            XlsxExporter::budget_file_name(&actividad),
            "presupuesto_campamento_huampaní_2024.xlsx"
        );
    }

    #[test]
    fn test_sheet_value_from_blank_option_is_empty() {
        assert_eq!(SheetValue::from(Some("")), SheetValue::Empty);
        assert_eq!(SheetValue::from(None::<&str>), SheetValue::Empty);
        assert_eq!(SheetValue::from(Some("x")), SheetValue::Text("x".to_string()));
    }
}

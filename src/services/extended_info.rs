//! 扩展信息服务 - 业务能力层
//!
//! 用 HTTP 直接查询欠款和申报遗漏，解析返回的表格

use std::time::Duration;

use scraper::{ElementRef, Html};
use tracing::{debug, info};

use crate::clients::HttpFetcher;
use crate::error::{QueryError, Result};
use crate::models::{DebtRecord, ExtendedInfo, ExtendedRecord, OmissionRecord};
use crate::services::result_extractor::{cell_text, selector};

/// "没有记录"的提示文本前缀
pub const NO_RECORDS_PREFIX: &str = "No";

/// 扩展信息服务
pub struct ExtendedInfoClient<H: HttpFetcher> {
    http: H,
    url: String,
    timeout: Duration,
}

impl<H: HttpFetcher> ExtendedInfoClient<H> {
    pub fn new(http: H, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            url: url.into(),
            timeout,
        }
    }

    /// 查询一类扩展记录，类型由 `R::ACTION` 决定
    pub async fn fetch<R: ExtendedRecord>(&self, ruc: &str, name: &str) -> Result<Vec<R>> {
        let action = R::ACTION;
        let params = [("nroRuc", ruc), ("desRuc", name), ("accion", action.code())];

        let body = self
            .http
            .get(&self.url, &params, self.timeout)
            .await
            .map_err(|e| match e {
                QueryError::NetworkTimeout(_) => QueryError::NetworkTimeout(format!(
                    "{} 未在 {} 秒内响应",
                    action.code(),
                    self.timeout.as_secs()
                )),
                other => other,
            })?;

        let records = parse_extended_page::<R>(&body)?;
        debug!("{}: {} 条记录", action.record_name(), records.len());
        Ok(records)
    }

    /// 依次查询欠款和申报遗漏
    pub async fn fetch_all(&self, ruc: &str, name: &str) -> Result<ExtendedInfo> {
        let debts = self.fetch::<DebtRecord>(ruc, name).await?;
        let omissions = self.fetch::<OmissionRecord>(ruc, name).await?;
        info!(
            "✓ 扩展信息: {} 条欠款, {} 条申报遗漏",
            debts.len(),
            omissions.len()
        );
        Ok(ExtendedInfo { debts, omissions })
    }
}

/// 解析扩展信息页面
///
/// 第一个顶层表格是标题，第二个是查询结果。
pub fn parse_extended_page<R: ExtendedRecord>(markup: &str) -> Result<Vec<R>> {
    let html = Html::parse_document(markup);
    let table = selector("table")?;
    let intro = selector("td.bgn")?;
    let tr = selector("tr")?;
    let td = selector("td")?;

    let results_table = html
        .select(&table)
        .filter(|t| !inside_table(*t))
        .nth(1)
        .ok_or_else(|| QueryError::field_parse(R::ACTION.record_name(), "页面中没有结果表格"))?;

    if let Some(cell) = results_table.select(&intro).next() {
        if cell_text(cell).starts_with(NO_RECORDS_PREFIX) {
            return Ok(Vec::new());
        }
    }

    let records_table = match results_table
        .select(&table)
        .next()
        .and_then(|outer| outer.select(&table).next())
    {
        Some(t) => t,
        None => return Ok(Vec::new()),
    };

    // 第一行是表头
    let rows: Vec<ElementRef<'_>> = records_table.select(&tr).skip(1).collect();
    let first_cell = match rows.first().and_then(|row| row.select(&td).next()) {
        Some(cell) => cell,
        None => return Ok(Vec::new()),
    };
    // 表格内只有一行提示信息的情况
    if cell_text(first_cell).starts_with(NO_RECORDS_PREFIX) {
        return Ok(Vec::new());
    }

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row.select(&td).map(cell_text).collect();
            R::from_row(&cells)
        })
        .collect()
}

fn inside_table(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn page(intro: &str, rows: &str) -> String {
        format!(
            r#"<html><body>
            <table><tr><td class="bgt">Consulta RUC</td></tr></table>
            <table>
              <tr><td class="bgn">{intro}</td></tr>
              <tr><td>
                <table><tr><td>
                  <table>
                    <tr><td>Monto</td><td>Periodo</td><td>Fecha</td><td>Entidad</td></tr>
                    {rows}
                  </table>
                </td></tr></table>
              </td></tr>
            </table>
            </body></html>"#,
            intro = intro,
            rows = rows
        )
    }

    #[test]
    fn test_parse_debt_rows() {
        let markup = page(
            "Deuda Coactiva remitida a Centrales de Riesgo",
            r#"<tr><td> 1500.00 </td><td>2023-01</td><td>2023-03-15</td><td>ENTIDAD X</td></tr>
               <tr><td>2,000.50</td><td>2023-02</td><td>2023-04-15</td><td>ENTIDAD Y</td></tr>"#,
        );

        let debts = parse_extended_page::<DebtRecord>(&markup).unwrap();
        assert_eq!(debts.len(), 2);
        assert_eq!(debts[0].amount, dec!(1500.00));
        assert_eq!(debts[0].entity, "ENTIDAD X");
        assert_eq!(debts[1].amount, dec!(2000.50));
        assert_eq!(debts[1].period, "2023-02");
    }

    #[test]
    fn test_intro_sentinel_wins_over_rows() {
        let markup = page(
            "No se encontraron registros",
            r#"<tr><td>1500.00</td><td>2023-01</td><td>2023-03-15</td><td>ENTIDAD X</td></tr>"#,
        );
        assert!(parse_extended_page::<DebtRecord>(&markup).unwrap().is_empty());
        assert!(parse_extended_page::<OmissionRecord>(&markup).unwrap().is_empty());
    }

    #[test]
    fn test_table_internal_sentinel() {
        let markup = page(
            "Omisiones Tributarias",
            r#"<tr><td colspan="2">No hay información</td></tr>"#,
        );
        assert!(parse_extended_page::<OmissionRecord>(&markup).unwrap().is_empty());
    }

    #[test]
    fn test_wrong_cell_count_is_shape_error() {
        let markup = page(
            "Deuda Coactiva",
            r#"<tr><td>1500.00</td><td>2023-01</td><td>ENTIDAD X</td></tr>"#,
        );
        assert!(matches!(
            parse_extended_page::<DebtRecord>(&markup),
            Err(QueryError::RecordShape { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_parse_omission_rows() {
        let markup = page(
            "Omisiones Tributarias",
            r#"<tr><td>2023-05</td><td>IGV</td></tr><tr><td>2023-06</td><td>RENTA</td></tr>"#,
        );
        let omissions = parse_extended_page::<OmissionRecord>(&markup).unwrap();
        assert_eq!(omissions.len(), 2);
        assert_eq!(omissions[1].tax_type, "RENTA");
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let markup = page("Omisiones Tributarias", "");
        assert!(parse_extended_page::<OmissionRecord>(&markup).unwrap().is_empty());
    }

    struct SlowPortal;

    impl HttpFetcher for SlowPortal {
        async fn get(&self, _: &str, params: &[(&str, &str)], _: Duration) -> Result<String> {
            assert_eq!(params[0], ("nroRuc", "20123456786"));
            assert_eq!(params[2], ("accion", "getInfoDC"));
            Err(QueryError::NetworkTimeout("operation timed out".to_string()))
        }
    }

    #[test]
    fn test_fetch_timeout_names_action() {
        let client = ExtendedInfoClient::new(SlowPortal, "http://localhost", Duration::from_secs(5));
        let err = tokio_test::block_on(client.fetch_all("20123456786", "EMPRESA")).unwrap_err();

        match err {
            QueryError::NetworkTimeout(msg) => assert_eq!(msg, "getInfoDC 未在 5 秒内响应"),
            other => panic!("应该是超时错误: {:?}", other),
        }
    }

    #[test]
    fn test_missing_results_table() {
        let markup = "<table><tr><td>solo titulo</td></tr></table>";
        assert!(matches!(
            parse_extended_page::<DebtRecord>(markup),
            Err(QueryError::FieldParse { .. })
        ));
    }
}

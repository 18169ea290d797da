use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rust_decimal_macros::dec;
use sunat_ruc_query::browser::{
    no_such_element, BrowserDriver, DriverResult, PageElement, Point, Size,
};
use sunat_ruc_query::clients::{HttpFetcher, OcrEngine};
use sunat_ruc_query::services::captcha_solver::CAPTCHA_IMAGE_XPATH;
use sunat_ruc_query::services::form_submitter::{MODE_RADIO_XPATH, SUBMIT_BUTTON_XPATH};
use sunat_ruc_query::workflow::RESULT_FRAME_XPATH;
use sunat_ruc_query::{Config, QueryError, QueryProcessor};

// ========== 内存假实现 ==========

type EventLog = Arc<Mutex<Vec<String>>>;

fn record(log: &EventLog, event: impl Into<String>) {
    log.lock().unwrap().push(event.into());
}

struct FakeElement {
    xpath: String,
    index: usize,
    log: EventLog,
}

impl PageElement for FakeElement {
    async fn location(&self) -> DriverResult<Point> {
        if self.xpath == CAPTCHA_IMAGE_XPATH {
            Ok(Point { x: 10.0, y: 20.0 })
        } else {
            Ok(Point { x: 0.0, y: 0.0 })
        }
    }

    async fn size(&self) -> DriverResult<Size> {
        Ok(Size {
            width: 40.0,
            height: 15.0,
        })
    }

    async fn click(&self) -> DriverResult<()> {
        record(&self.log, format!("click:{}#{}", self.xpath, self.index));
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        record(&self.log, format!("keys:{}", text));
        Ok(())
    }
}

struct FakeDriver {
    log: EventLog,
    missing: HashSet<&'static str>,
    current_frame: Option<String>,
    result_page: String,
}

impl FakeDriver {
    fn new(log: EventLog) -> Self {
        Self {
            log,
            missing: HashSet::new(),
            current_frame: None,
            result_page: RESULT_PAGE.to_string(),
        }
    }

    fn element(&self, xpath: &str, index: usize) -> FakeElement {
        FakeElement {
            xpath: xpath.to_string(),
            index,
            log: self.log.clone(),
        }
    }
}

impl BrowserDriver for FakeDriver {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        record(&self.log, format!("navigate:{}", url));
        self.current_frame = None;
        Ok(())
    }

    async fn find_element(&mut self, xpath: &str) -> DriverResult<FakeElement> {
        if self.missing.contains(xpath) {
            return Err(no_such_element(xpath, "Unable to locate element"));
        }
        Ok(self.element(xpath, 0))
    }

    async fn find_elements(&mut self, xpath: &str) -> DriverResult<Vec<FakeElement>> {
        let count = if xpath == MODE_RADIO_XPATH { 3 } else { 1 };
        Ok((0..count).map(|i| self.element(xpath, i)).collect())
    }

    async fn screenshot(&mut self) -> DriverResult<Vec<u8>> {
        record(&self.log, "screenshot");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([255, 255, 255])));
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        Ok(png)
    }

    async fn switch_to_frame(&mut self, frame: &FakeElement) -> DriverResult<()> {
        record(&self.log, format!("frame:{}", frame.xpath));
        self.current_frame = Some(frame.xpath.clone());
        Ok(())
    }

    async fn switch_to_top(&mut self) -> DriverResult<()> {
        record(&self.log, "top");
        self.current_frame = None;
        Ok(())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        match self.current_frame.as_deref() {
            Some(RESULT_FRAME_XPATH) => Ok(self.result_page.clone()),
            _ => Ok("<html><body></body></html>".to_string()),
        }
    }
}

struct FakeOcr {
    text: &'static str,
}

impl OcrEngine for FakeOcr {
    async fn recognize_text(&self, image: &DynamicImage) -> sunat_ruc_query::Result<String> {
        assert_eq!((image.width(), image.height()), (40, 15));
        Ok(format!("{}\n", self.text))
    }
}

enum Reply {
    Page(&'static str),
    Timeout,
}

struct FakeHttp {
    log: EventLog,
    replies: HashMap<&'static str, Reply>,
}

impl HttpFetcher for FakeHttp {
    async fn get(
        &self,
        _url: &str,
        params: &[(&str, &str)],
        _timeout: Duration,
    ) -> sunat_ruc_query::Result<String> {
        let action = params
            .iter()
            .find(|(k, _)| *k == "accion")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        let name = params
            .iter()
            .find(|(k, _)| *k == "desRuc")
            .map(|(_, v)| v.to_string())
            .unwrap_or_default();
        record(&self.log, format!("http:{}:{}", action, name));

        match self.replies.get(action.as_str()) {
            Some(Reply::Page(body)) => Ok(body.to_string()),
            Some(Reply::Timeout) | None => Err(QueryError::NetworkTimeout("fake".to_string())),
        }
    }
}

// ========== 测试页面 ==========

const RESULT_PAGE: &str = r#"
<html><body>
<table>
  <tr><td class="bgn">Número de RUC: </td><td class="bg">20123456786 - EMPRESA DEMO S.A.C.</td></tr>
  <tr><td class="bgn">Nombre Comercial:</td><td class="bg">-</td></tr>
  <tr><td class="bgn">Estado del Contribuyente: </td><td class="bg">ACTIVO</td></tr>
  <tr><td class="bgn">Condición del Contribuyente:</td><td class="bg">HABIDO</td></tr>
  <tr><td class="bgn">Actividad(es) Económica(s):</td><td class="bg">
    <!--<select name="select">-->
    <!--<option value="00">Principal - 74996 - OTRAS ACTIVIDADES EMPRESARIALES NCP - CIIU Rev.3</option>-->
    <!--</select>-->
    <select name="select">
      <option value="00">Principal - 82990 - OTRAS ACTIVIDADES DE SERVICIOS DE APOYO</option>
    </select>
  </td></tr>
</table>
</body></html>
"#;

const DEBT_PAGE: &str = r#"
<html><body>
<table><tr><td>Deuda Coactiva</td></tr></table>
<table>
  <tr><td class="bgn">Deuda Coactiva remitida a Centrales de Riesgo</td></tr>
  <tr><td><table><tr><td><table>
    <tr><td>Monto</td><td>Periodo</td><td>Fecha</td><td>Entidad</td></tr>
    <tr><td>1500.00</td><td>2023-01</td><td>2023-03-15</td><td>ENTIDAD X</td></tr>
  </table></td></tr></table></td></tr>
</table>
</body></html>
"#;

const EMPTY_PAGE: &str = r#"
<html><body>
<table><tr><td>Omisiones Tributarias</td></tr></table>
<table>
  <tr><td class="bgn">No se encontraron registros</td></tr>
</table>
</body></html>
"#;

// ========== 辅助函数 ==========

fn test_config(timeout_retries: u32) -> Config {
    Config {
        timeout_pause_secs: 0,
        timeout_retries,
        ..Config::default()
    }
}

fn processor(
    log: &EventLog,
    driver: FakeDriver,
    captcha: &'static str,
    debt_reply: Reply,
    config: &Config,
) -> QueryProcessor<FakeDriver, FakeOcr, FakeHttp> {
    let mut replies = HashMap::new();
    replies.insert("getInfoDC", debt_reply);
    replies.insert("getInfoOT", Reply::Page(EMPTY_PAGE));
    let http = FakeHttp {
        log: log.clone(),
        replies,
    };
    QueryProcessor::new(driver, FakeOcr { text: captcha }, http, config)
}

fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// 第一次 HTTP 请求之后回到顶层文档的次数
fn resets_after_http(events: &[String]) -> usize {
    let first_http = events
        .iter()
        .position(|e| e.starts_with("http:"))
        .expect("应该发出过 HTTP 请求");
    events[first_http..].iter().filter(|e| *e == "top").count()
}

// ========== 测试 ==========

#[tokio::test]
async fn test_successful_query_merges_records() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB12",
        Reply::Page(DEBT_PAGE),
        &config,
    );

    let record = processor
        .get_record("20123456786")
        .await
        .unwrap()
        .expect("应该查到记录");

    assert_eq!(record.id, 20123456786);
    assert_eq!(record.legal_name, "EMPRESA DEMO S.A.C.");
    assert_eq!(record.commercial_name, None);
    assert_eq!(record.status, "ACTIVO");
    assert_eq!(record.condition, "HABIDO");

    let codes: Vec<(&str, u8)> = record
        .classification_codes
        .iter()
        .map(|c| (c.code.as_str(), c.revision))
        .collect();
    assert_eq!(codes, vec![("82990", 4), ("74996", 3)]);

    assert_eq!(record.debts.len(), 1);
    assert_eq!(record.debts[0].amount, dec!(1500.00));
    assert_eq!(record.debts[0].entity, "ENTIDAD X");
    assert!(record.omissions.is_empty());

    let events = events(&log);
    assert!(events.contains(&"keys:20123456786".to_string()));
    assert!(events.contains(&"keys:AB12".to_string()));
    assert!(events.contains(&format!("click:{}#0", MODE_RADIO_XPATH)));
    // 先查欠款再查申报遗漏，都以解析出的名称为参数
    let http: Vec<&String> = events.iter().filter(|e| e.starts_with("http:")).collect();
    assert_eq!(
        http,
        vec![
            "http:getInfoDC:EMPRESA DEMO S.A.C.",
            "http:getInfoOT:EMPRESA DEMO S.A.C."
        ]
    );
    assert_eq!(resets_after_http(&events), 1);
}

#[tokio::test]
async fn test_timeout_is_contained_and_resets_once() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB12",
        Reply::Timeout,
        &config,
    );

    let result = processor.get_record("20123456786").await.unwrap();
    assert!(result.is_none());

    let events = events(&log);
    assert_eq!(resets_after_http(&events), 1);
    assert_eq!(events.last().map(String::as_str), Some("top"));
}

#[tokio::test]
async fn test_timeout_retry_runs_whole_sequence_again() {
    let log = EventLog::default();
    let config = test_config(1);
    let mut processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB12",
        Reply::Timeout,
        &config,
    );

    assert!(processor.get_record("20123456786").await.unwrap().is_none());

    let events = events(&log);
    let navigations = events.iter().filter(|e| e.starts_with("navigate:")).count();
    assert_eq!(navigations, 2);
}

#[tokio::test]
async fn test_invalid_id_fails_before_browser() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB12",
        Reply::Page(DEBT_PAGE),
        &config,
    );

    assert!(matches!(
        processor.get_record("20123456780").await,
        Err(QueryError::InvalidId(_))
    ));
    assert!(matches!(
        processor.get_record("2012345678X").await,
        Err(QueryError::MalformedId(_))
    ));
    assert!(matches!(
        processor.get_record_by_number(123).await,
        Err(QueryError::MalformedId(_))
    ));
    assert!(events(&log).is_empty());
}

#[tokio::test]
async fn test_captcha_failure_returns_none_without_submitting() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB1",
        Reply::Page(DEBT_PAGE),
        &config,
    );

    assert!(processor.get_record("20123456786").await.unwrap().is_none());

    let events = events(&log);
    assert!(events.contains(&"screenshot".to_string()));
    assert!(!events.iter().any(|e| e.starts_with("click:")));
    assert!(!events.iter().any(|e| e.starts_with("http:")));
    assert_eq!(events.last().map(String::as_str), Some("top"));
}

#[tokio::test]
async fn test_missing_element_submits_nothing() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut driver = FakeDriver::new(log.clone());
    driver.missing.insert(SUBMIT_BUTTON_XPATH);
    let mut processor = processor(&log, driver, "AB12", Reply::Page(DEBT_PAGE), &config);

    assert!(processor.get_record("20123456786").await.unwrap().is_none());

    let events = events(&log);
    assert!(!events.iter().any(|e| e.starts_with("click:")));
    assert!(!events.iter().any(|e| e.starts_with("keys:")));
}

#[tokio::test]
async fn test_portal_error_page_returns_none() {
    let log = EventLog::default();
    let config = test_config(0);
    let mut driver = FakeDriver::new(log.clone());
    driver.result_page =
        r#"<html><body><p class="error">El número de RUC no es válido</p></body></html>"#
            .to_string();
    let mut processor = processor(&log, driver, "AB12", Reply::Page(DEBT_PAGE), &config);

    assert!(processor.get_record("20123456786").await.unwrap().is_none());
    assert!(!events(&log).iter().any(|e| e.starts_with("http:")));
}

#[tokio::test]
async fn test_search_by_name_is_empty() {
    let log = EventLog::default();
    let config = test_config(0);
    let processor = processor(
        &log,
        FakeDriver::new(log.clone()),
        "AB12",
        Reply::Page(DEBT_PAGE),
        &config,
    );

    assert!(processor.search_by_name("EMPRESA DEMO").is_empty());
    assert!(events(&log).is_empty());
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_query() {
    use sunat_ruc_query::browser::acquire_browser;
    use sunat_ruc_query::clients::{PortalHttpClient, TesseractOcr};
    use sunat_ruc_query::utils::logging;
    use sunat_ruc_query::{CdpDriver, JsExecutor};

    let config = Config::from_env();
    logging::init(true);

    let (_browser, page) = acquire_browser(&config).await.expect("获取浏览器失败");
    let driver = CdpDriver::new(JsExecutor::new(page), config.page_load_timeout());
    let mut processor = QueryProcessor::new(
        driver,
        TesseractOcr::new(&config),
        PortalHttpClient::new(),
        &config,
    );

    // 验证码识别可能失败，所以只检查不会返回错误
    let result = processor.get_record("20100070970").await;
    assert!(result.is_ok());
    if let Ok(Some(record)) = result {
        println!("{}", serde_json::to_string_pretty(&record).unwrap());
    }
}

//! 结果页解析服务 - 业务能力层
//!
//! 只负责把结果 frame 的 HTML 解析成 `BasicRecord`，不关心页面是怎么拿到的

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::error::{QueryError, Result};
use crate::models::{reconcile_codes, BasicRecord, ClassificationCode};

const RUC_LABEL: &str = r"(?i)n[úu]mero\s+de\s+ruc:";
const COMMERCIAL_NAME_LABEL: &str = r"(?i)nombre\s+comercial:";
const STATUS_LABEL: &str = r"(?i)estado\s+del?\s+contribuyente:";
const CONDITION_LABEL: &str = r"(?i)condici[óo]n\s+del\s+contribuyente:";

/// 注释中 CIIU 下拉框的起始标记
const COMMENT_SELECT_START: &str = r#"<select name="select""#;
const COMMENT_OPTION: &str = "<option";
const COMMENT_SELECT_END: &str = "</select>";

pub(crate) fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| QueryError::Pattern(format!("{}: {}", css, e)))
}

pub(crate) fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// 结果页解析服务
#[derive(Debug, Default)]
pub struct ResultExtractor;

impl ResultExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 解析结果页
    pub fn extract(&self, markup: &str) -> Result<BasicRecord> {
        let html = Html::parse_document(markup);

        if let Some(error) = html.select(&selector("p.error")?).next() {
            return Err(QueryError::Portal(cell_text(error)));
        }

        let (id, legal_name) = parse_ruc_and_name(&labelled_value(&html, RUC_LABEL, "RUC")?)?;
        let commercial_name = match labelled_value(&html, COMMERCIAL_NAME_LABEL, "nombre comercial") {
            Ok(name) if !name.is_empty() && name != "-" => Some(name),
            Ok(_) => None,
            Err(QueryError::FieldParse { .. }) => None,
            Err(e) => return Err(e),
        };
        let status = labelled_value(&html, STATUS_LABEL, "estado")?;
        let condition = labelled_value(&html, CONDITION_LABEL, "condición")?;
        let classification_codes = self.classification_codes(&html)?;

        debug!(
            "解析结果: RUC {} | {} | {} | {} | {} 个 CIIU",
            id,
            legal_name,
            status,
            condition,
            classification_codes.len()
        );

        Ok(BasicRecord {
            id,
            legal_name,
            commercial_name,
            status,
            condition,
            classification_codes,
        })
    }

    /// 合并注释中的历史 CIIU 和下拉框中的 CIIU
    fn classification_codes(&self, html: &Html) -> Result<Vec<ClassificationCode>> {
        let from_comments = parse_codes(comment_option_texts(html)?);
        let from_dropdown = parse_codes(dropdown_option_texts(html)?);
        Ok(reconcile_codes(&from_comments, &from_dropdown))
    }
}

/// 标签单元格之后的下一个单元格的文本
///
/// 标签单元格必须是不含嵌套单元格的 `td`，否则外层表格的单元格也会匹配。
fn labelled_value(html: &Html, label_pattern: &str, field: &str) -> Result<String> {
    let label = Regex::new(label_pattern)?;
    let td = selector("td")?;
    let cells: Vec<ElementRef<'_>> = html.select(&td).collect();

    let position = cells
        .iter()
        .position(|cell| !has_nested_cell(*cell) && label.is_match(&cell_text(*cell)))
        .ok_or_else(|| QueryError::field_parse(field, "结果页中未找到该字段"))?;

    cells
        .get(position + 1)
        .map(|cell| cell_text(*cell))
        .ok_or_else(|| QueryError::field_parse(field, "标签后没有值单元格"))
}

fn has_nested_cell(cell: ElementRef<'_>) -> bool {
    cell.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().name() == "td")
}

/// "20123456786 - EMPRESA S.A.C." → (20123456786, "EMPRESA S.A.C.")
pub fn parse_ruc_and_name(text: &str) -> Result<(u64, String)> {
    let tokens: Vec<&str> = text.split('-').collect();
    let ruc_token = tokens[0].trim();
    let ruc = ruc_token
        .parse::<u64>()
        .map_err(|_| QueryError::field_parse("RUC", format!("无法从 {:?} 中获取 RUC", ruc_token)))?;

    if tokens.len() < 2 {
        return Err(QueryError::field_parse(
            "RUC",
            format!("缺少名称部分: {:?}", text),
        ));
    }

    Ok((ruc, tokens[1..].join("-").trim().to_string()))
}

/// 从注释块中提取 CIIU 选项文本
///
/// 注释块从第一个包含 `<select name="select"` 的注释开始，
/// 到第一个包含 `</select>` 的注释结束；中间每个含 `<option` 的注释单独解析。
fn comment_option_texts(html: &Html) -> Result<Vec<String>> {
    let option = selector("option")?;
    let mut texts = Vec::new();
    let mut started = false;

    for node in html.tree.root().descendants() {
        let comment: &str = match node.value() {
            Node::Comment(comment) => &**comment,
            _ => continue,
        };

        if !started && comment.contains(COMMENT_SELECT_START) {
            started = true;
        }
        if !started {
            continue;
        }

        if comment.contains(COMMENT_OPTION) {
            let fragment = Html::parse_fragment(comment);
            let options: Vec<String> = fragment
                .select(&option)
                .map(cell_text)
                .filter(|t| !t.is_empty())
                .collect();
            if options.is_empty() {
                texts.push(fragment.root_element().text().collect::<String>().trim().to_string());
            } else {
                texts.extend(options);
            }
        }
        if comment.contains(COMMENT_SELECT_END) {
            break;
        }
    }

    Ok(texts)
}

/// 页面上 `select[name="select"]` 的选项文本，没有下拉框时为空
fn dropdown_option_texts(html: &Html) -> Result<Vec<String>> {
    let select = selector(r#"select[name="select"]"#)?;
    let option = selector("option")?;

    Ok(html
        .select(&select)
        .next()
        .map(|s| s.select(&option).map(cell_text).collect())
        .unwrap_or_default())
}

/// 无法识别的文本（例如占位的 "-"）直接跳过
fn parse_codes(texts: Vec<String>) -> Vec<ClassificationCode> {
    texts
        .iter()
        .filter_map(|t| match t.parse::<ClassificationCode>() {
            Ok(code) => Some(code),
            Err(e) => {
                debug!("跳过无法识别的 CIIU: {}", e);
                None
            }
        })
        .collect()
}

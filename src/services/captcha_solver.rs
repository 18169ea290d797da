//! 验证码识别服务 - 业务能力层
//!
//! 截图 → 按验证码图片的位置裁剪 → OCR。本层不做重试。

use image::DynamicImage;
use tracing::{debug, info};

use crate::browser::{BrowserDriver, ElementBox, PageElement};
use crate::clients::OcrEngine;
use crate::error::{QueryError, Result};
use crate::workflow::QuerySession;

/// 验证码图片
pub const CAPTCHA_IMAGE_XPATH: &str = r#"//img[@src="captcha?accion=image"]"#;
/// 验证码长度
pub const CAPTCHA_LEN: usize = 4;

/// 验证码识别服务
pub struct CaptchaSolver<O: OcrEngine> {
    ocr: O,
}

impl<O: OcrEngine> CaptchaSolver<O> {
    pub fn new(ocr: O) -> Self {
        Self { ocr }
    }

    /// 识别查询表单 frame 中的验证码
    pub async fn solve<D: BrowserDriver>(
        &self,
        session: &mut QuerySession<'_, D>,
        search_frame: &D::Element,
    ) -> Result<String> {
        let captcha = self.capture(session, search_frame).await?;
        let raw = self.ocr.recognize_text(&captcha).await?;
        let text = validate_captcha_text(&raw)?;
        info!("🔤 验证码识别结果: {}", text);
        Ok(text)
    }

    /// 进入 frame 截图并裁剪出验证码，完成后回到顶层文档
    async fn capture<D: BrowserDriver>(
        &self,
        session: &mut QuerySession<'_, D>,
        search_frame: &D::Element,
    ) -> Result<DynamicImage> {
        session.enter_frame(search_frame).await?;

        let screenshot = session.driver().screenshot().await?;
        let img_elem = session.driver().find_element(CAPTCHA_IMAGE_XPATH).await?;
        let region = ElementBox::new(img_elem.location().await?, img_elem.size().await?);
        debug!("验证码区域: {:?}", region);

        let captcha = crop_screenshot(&screenshot, &region)?;
        drop(screenshot);

        session.leave_frame().await?;
        Ok(captcha)
    }
}

/// 解码 PNG 截图并裁剪
pub fn crop_screenshot(png: &[u8], region: &ElementBox) -> Result<DynamicImage> {
    let image = image::load_from_memory(png)?;
    Ok(crop_image(&image, region))
}

/// 裁剪 (x, y) - (x + width, y + height) 区域，超出图片的部分被截掉
pub fn crop_image(image: &DynamicImage, region: &ElementBox) -> DynamicImage {
    let (left, top, right, bottom) = region.crop_rect();
    image.crop_imm(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    )
}

/// 去掉首尾空白后必须正好 4 个字符
pub fn validate_captcha_text(raw: &str) -> Result<String> {
    let text = raw.trim();
    if text.chars().count() != CAPTCHA_LEN {
        return Err(QueryError::CaptchaRead(text.to_string()));
    }
    Ok(text.to_string())
}

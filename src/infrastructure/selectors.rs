//! 门户页面定位器
//!
//! 页面结构变化时只需修改这里。

use crate::infrastructure::Locator;

// ========== 登录 ==========

pub fn sso_button() -> Locator {
    Locator::xpath("//a[contains(@class, 'sso-button') and contains(@class, 'primary')]")
}

pub fn username_field() -> Locator {
    Locator::css("#ssousername")
}

pub fn password_field() -> Locator {
    Locator::css("#ssopassword")
}

pub fn login_proceed_button() -> Locator {
    Locator::css("[name='_eventId_proceed']")
}

// ========== 职位列表 ==========

pub fn last_page_button() -> Locator {
    Locator::css("nav[data-hook='job-search-pagination'] button[data-page='last']")
}

pub fn next_page_button() -> Locator {
    Locator::css("nav[data-hook='job-search-pagination'] button[aria-label='next page']")
}

pub fn job_result_card() -> Locator {
    Locator::css("div[data-hook^='job-result-card']")
}

pub fn job_result_link() -> Locator {
    Locator::xpath(
        "//div[contains(@data-hook, 'job-result-card')]//a[contains(@href, '/job-search/')]",
    )
}

// ========== 职位详情 ==========

/// 详情页加载完成的标志
pub fn share_button() -> Locator {
    Locator::xpath("//button[text()='Share' or contains(text(), 'Share')]")
}

pub fn employer_link() -> Locator {
    Locator::xpath("//a[contains(@href, '/e/')][@aria-label][@data-size='xlarge']")
}

pub fn job_title() -> Locator {
    Locator::css("h1")
}

pub fn apply_button() -> Locator {
    Locator::css("button[aria-label='Apply']")
}

pub fn apply_externally_button() -> Locator {
    Locator::css("button[aria-label='Apply externally']")
}

// ========== 申请弹窗 ==========

pub fn apply_modal() -> Locator {
    Locator::css("div[data-hook='apply-modal-content']")
}

pub fn submit_application_button() -> Locator {
    Locator::xpath("//button[text()='Submit Application']")
}

/// 弹窗中的每个表单项
pub fn modal_fieldset() -> Locator {
    Locator::css("fieldset")
}

pub fn file_input() -> Locator {
    Locator::css("input[type='file']")
}

/// 上传完成后表单项中出现的勾选图标
pub fn upload_checkmark() -> Locator {
    Locator::css("svg")
}

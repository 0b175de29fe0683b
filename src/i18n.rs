//! Built-in UI strings.

use crate::settings::UiLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    WindowTitle,
    InputPlaceholder,
    Process,
    PrimaryFont,
    SecondaryFont,
    Color,
    Preview,
    CopyImage,
    CopyText,
    SavePng,
    Copied,
    Hint,
    AlwaysOnTop,
    AlwaysOnTopActive,
    UnitColor,
    Readings,
    NoReadings,
    AddFont,
    RemoveFont,
    HotkeysUnavailable,
    CheckUpdates,
    NoUpdates,
    UpdateAvailable,
    UpdateCheckFailed,
    Downloading,
    DownloadFailed,
    Install,
    Later,
    Cancel,
    InstallFailed,
    Close,
    SavedTo,
    NothingToProcess,
    ShowWindow,
    Quit,
}

/// `{version}`, `{error}` and `{path}` placeholders are filled in by the caller.
pub fn tr(lang: UiLanguage, text: Text) -> &'static str {
    match lang {
        UiLanguage::English => english(text),
        UiLanguage::Russian => russian(text),
        UiLanguage::Chinese => chinese(text),
    }
}

fn english(text: Text) -> &'static str {
    match text {
        Text::WindowTitle => "Pinyin Helper",
        Text::InputPlaceholder => "Type or paste Chinese text…",
        Text::Process => "Process",
        Text::PrimaryFont => "Characters:",
        Text::SecondaryFont => "Pinyin:",
        Text::Color => "Color",
        Text::Preview => "Preview",
        Text::CopyImage => "Copy as image",
        Text::CopyText => "Copy as text",
        Text::SavePng => "Save PNG…",
        Text::Copied => "✔ Copied!",
        Text::Hint => "Press Ctrl+C twice in any application to capture text. Right-click a syllable for readings and color.",
        Text::AlwaysOnTop => "Top",
        Text::AlwaysOnTopActive => "Top ✔",
        Text::UnitColor => "Color…",
        Text::Readings => "Readings",
        Text::NoReadings => "No variants",
        Text::AddFont => "Add font",
        Text::RemoveFont => "Remove",
        Text::HotkeysUnavailable => "Copy gestures are unavailable: {error}",
        Text::CheckUpdates => "Check for updates",
        Text::NoUpdates => "You are running the latest version.",
        Text::UpdateAvailable => "Version {version} is available. Download and install it now?",
        Text::UpdateCheckFailed => "Could not check for updates: {error}",
        Text::Downloading => "Downloading update…",
        Text::DownloadFailed => "Download failed: {error}",
        Text::Install => "Install",
        Text::Later => "Later",
        Text::Cancel => "Cancel",
        Text::InstallFailed => "Could not start the installer: {error}",
        Text::Close => "Close",
        Text::ShowWindow => "Show window",
        Text::Quit => "Quit",
        Text::SavedTo => "Saved to {path}",
        Text::NothingToProcess => "Nothing to process.",
    }
}

fn russian(text: Text) -> &'static str {
    match text {
        Text::WindowTitle => "Pinyin Helper",
        Text::InputPlaceholder => "Введите или вставьте китайский текст…",
        Text::Process => "Обработать",
        Text::PrimaryFont => "Иероглифы:",
        Text::SecondaryFont => "Пиньинь:",
        Text::Color => "Цвет",
        Text::Preview => "Предпросмотр",
        Text::CopyImage => "Копировать как картинку",
        Text::CopyText => "Копировать как текст",
        Text::SavePng => "Сохранить PNG…",
        Text::Copied => "✔ Скопировано!",
        Text::Hint => "Дважды нажмите Ctrl+C в любом приложении, чтобы захватить текст. Правый клик по слогу: варианты и цвет.",
        Text::AlwaysOnTop => "Поверх",
        Text::AlwaysOnTopActive => "Поверх ✔",
        Text::UnitColor => "Цвет…",
        Text::Readings => "Чтения",
        Text::NoReadings => "Нет вариантов",
        Text::AddFont => "Добавить шрифт",
        Text::RemoveFont => "Удалить",
        Text::HotkeysUnavailable => "Жесты копирования недоступны: {error}",
        Text::CheckUpdates => "Проверить обновления",
        Text::NoUpdates => "У вас последняя версия.",
        Text::UpdateAvailable => "Доступна версия {version}. Скачать и установить?",
        Text::UpdateCheckFailed => "Не удалось проверить обновления: {error}",
        Text::Downloading => "Загрузка обновления…",
        Text::DownloadFailed => "Ошибка загрузки: {error}",
        Text::Install => "Установить",
        Text::Later => "Позже",
        Text::Cancel => "Отмена",
        Text::InstallFailed => "Не удалось запустить установщик: {error}",
        Text::Close => "Закрыть",
        Text::ShowWindow => "Показать окно",
        Text::Quit => "Выход",
        Text::SavedTo => "Сохранено: {path}",
        Text::NothingToProcess => "Нечего обрабатывать.",
    }
}

fn chinese(text: Text) -> &'static str {
    match text {
        Text::WindowTitle => "拼音助手",
        Text::InputPlaceholder => "输入或粘贴中文…",
        Text::Process => "生成",
        Text::PrimaryFont => "汉字：",
        Text::SecondaryFont => "拼音：",
        Text::Color => "颜色",
        Text::Preview => "预览",
        Text::CopyImage => "复制为图片",
        Text::CopyText => "复制为文本",
        Text::SavePng => "保存 PNG…",
        Text::Copied => "✔ 已复制！",
        Text::Hint => "在任意程序中连按两次 Ctrl+C 即可获取文本。右键点击拼音可选择读音和颜色。",
        Text::AlwaysOnTop => "置顶",
        Text::AlwaysOnTopActive => "置顶 ✔",
        Text::UnitColor => "颜色…",
        Text::Readings => "读音",
        Text::NoReadings => "没有其他读音",
        Text::AddFont => "添加字体",
        Text::RemoveFont => "移除",
        Text::HotkeysUnavailable => "复制手势不可用：{error}",
        Text::CheckUpdates => "检查更新",
        Text::NoUpdates => "已是最新版本。",
        Text::UpdateAvailable => "发现新版本 {version}，是否立即下载安装？",
        Text::UpdateCheckFailed => "检查更新失败：{error}",
        Text::Downloading => "正在下载更新…",
        Text::DownloadFailed => "下载失败：{error}",
        Text::Install => "安装",
        Text::Later => "稍后",
        Text::Cancel => "取消",
        Text::InstallFailed => "无法启动安装程序：{error}",
        Text::Close => "关闭",
        Text::ShowWindow => "显示窗口",
        Text::Quit => "退出",
        Text::SavedTo => "已保存到 {path}",
        Text::NothingToProcess => "没有可处理的文本。",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_survive_translation() {
        let keyed = [
            (Text::HotkeysUnavailable, "{error}"),
            (Text::UpdateAvailable, "{version}"),
            (Text::UpdateCheckFailed, "{error}"),
            (Text::DownloadFailed, "{error}"),
            (Text::InstallFailed, "{error}"),
            (Text::SavedTo, "{path}"),
        ];
        for lang in UiLanguage::all() {
            for (text, placeholder) in keyed {
                assert!(tr(*lang, text).contains(placeholder), "{:?} {:?}", lang, text);
            }
        }
    }
}

use anyhow::Result;
use async_trait::async_trait;

use super::types::ChannelRecord;

#[async_trait]
pub trait ChannelSource: Send + Sync {
    /// Up to `max` channels for `category`, in source order.
    async fn list_channels(&self, category: &str, max: usize) -> Result<Vec<ChannelRecord>>;
}

/// Canned demonstration data standing in for a live TGStat fetch.
///
/// The requested category is not applied: every caller gets the same
/// "Маркетинг и PR" set, truncated to the limit. A live source is expected
/// to filter by category here.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticChannelSource;

const DEMO_CATEGORY: &str = "Маркетинг и PR";

// (name, handle, description, admin handle, subcategory, subscribers)
const DEMO_CHANNELS: &[(&str, &str, &str, &str, &str, i64)] = &[
    ("Маркетинг с нуля", "marketing_zero", "Практические советы по маркетингу для начинающих. Кейсы, инструменты, стратегии продвижения.", "admin_marketing", "SMM", 45_000),
    ("PR Daily", "pr_daily", "Ежедневные новости из мира PR и коммуникаций. Тренды, аналитика, инсайты.", "pr_expert", "PR", 32_000),
    ("Growth Hacking", "growth_hacks", "Лучшие тактики роста и масштабирования бизнеса. Кейсы успешных стартапов.", "growth_admin", "Growth", 28_000),
    ("Контент-маркетинг Pro", "content_marketing_pro", "Стратегии контент-маркетинга, копирайтинг, создание вирусного контента.", "content_admin", "Контент", 38_000),
    ("Email Marketing Hub", "email_marketing_hub", "Email-рассылки, автоворонки, конверсия. Практические руководства и инструменты.", "email_expert", "Email", 22_000),
    ("Таргетированная реклама", "target_ads", "Все о таргете в соцсетях: ВК, Instagram, Facebook. Кейсы и разборы кампаний.", "target_admin", "SMM", 41_000),
    ("Бренд-менеджмент", "brand_management", "Построение и развитие брендов. Позиционирование, репутация, коммуникации.", "brand_expert", "Бренд", 25_000),
    ("Influence Marketing", "influence_marketing", "Работа с инфлюенсерами и блогерами. Стратегии коллабораций и интеграций.", "influence_admin", "Инфлюенс", 19_000),
];

fn telegram_link(handle: &str) -> String {
    format!("https://t.me/{handle}")
}

impl StaticChannelSource {
    #[cfg(test)]
    pub fn available(&self) -> usize { DEMO_CHANNELS.len() }
}

#[async_trait]
impl ChannelSource for StaticChannelSource {
    async fn list_channels(&self, category: &str, max: usize) -> Result<Vec<ChannelRecord>> {
        tracing::debug!(requested = category, served = DEMO_CATEGORY, "static source ignores category");
        let channels = DEMO_CHANNELS
            .iter()
            .take(max)
            .map(|&(name, handle, description, admin, subcategory, subscribers)| ChannelRecord {
                name: name.to_string(),
                link: telegram_link(handle),
                description: description.to_string(),
                admin: telegram_link(admin),
                category: DEMO_CATEGORY.to_string(),
                subcategory: subcategory.to_string(),
                subscribers,
            })
            .collect();
        Ok(channels)
    }
}

use crate::config::Settings;
use crate::domain::financials::FinancialSnapshot;
use crate::domain::news::NewsArticle;
use crate::domain::recommendation::{Action, Recommendation};
use crate::domain::symbol::Symbol;
use crate::error::{DeliveryNotConfigured, InvalidInput};
use crate::ingest::financials::{AlphaVantageClient, FinancialsProvider};
use crate::ingest::news::{self, NewsProvider};
use crate::llm::recommend::RecommendationEngine;
use crate::notify::format::format_notification;
use crate::notify::twilio::TwilioClient;
use crate::notify::DeliveryChannel;
use crate::time::window::NewsWindow;
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Enrichment {
    pub symbol: Symbol,
    pub recommendation: Recommendation,
    pub articles: Vec<NewsArticle>,
    pub financials: FinancialSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotifyOutcome {
    pub symbol: Symbol,
    pub action: Action,
    pub delivery_id: String,
    pub recipient: String,
}

/// News → financials → recommendation, then optionally delivery. Stages run one after
/// another and the first failure aborts the rest.
pub struct Pipeline {
    news: Arc<dyn NewsProvider>,
    financials: Arc<dyn FinancialsProvider>,
    engine: RecommendationEngine,
    delivery: Option<Arc<dyn DeliveryChannel>>,
    default_recipient: Option<String>,
    news_window: NewsWindow,
}

impl Pipeline {
    pub fn new(
        news: Arc<dyn NewsProvider>,
        financials: Arc<dyn FinancialsProvider>,
        engine: RecommendationEngine,
    ) -> Self {
        Self {
            news,
            financials,
            engine,
            delivery: None,
            default_recipient: None,
            news_window: NewsWindow::default(),
        }
    }

    pub fn with_delivery(
        mut self,
        delivery: Arc<dyn DeliveryChannel>,
        default_recipient: Option<String>,
    ) -> Self {
        self.delivery = Some(delivery);
        self.default_recipient = default_recipient;
        self
    }

    pub fn with_news_window(mut self, window: NewsWindow) -> Self {
        self.news_window = window;
        self
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let news = news::provider_from_settings(settings)?;
        let financials: Arc<dyn FinancialsProvider> =
            Arc::new(AlphaVantageClient::from_settings(settings)?);
        let engine = RecommendationEngine::from_settings(settings)?;
        let window = NewsWindow::from_settings(settings.news_window_hours)?;

        let mut pipeline = Self::new(news, financials, engine).with_news_window(window);
        if settings.delivery_configured() {
            pipeline = pipeline.with_delivery(
                Arc::new(TwilioClient::from_settings(settings)?),
                settings.user_whatsapp_number.clone(),
            );
        } else {
            tracing::info!("twilio credentials not set; notifications disabled");
        }
        Ok(pipeline)
    }

    pub fn delivery_enabled(&self) -> bool {
        self.delivery.is_some()
    }

    pub async fn enrich(&self, symbol: &Symbol) -> anyhow::Result<Enrichment> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("enrich", %run_id, %symbol);
        self.run_stages(symbol).instrument(span).await
    }

    /// Runs the stages, formats the result and sends it to `recipient` (or the configured
    /// default). Returns the delivery id assigned by the messaging provider.
    pub async fn notify(
        &self,
        symbol: &Symbol,
        recipient: Option<&str>,
    ) -> anyhow::Result<NotifyOutcome> {
        let Some(delivery) = &self.delivery else {
            return Err(DeliveryNotConfigured.into());
        };
        let recipient = recipient
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or(self.default_recipient.as_deref())
            .ok_or_else(|| InvalidInput("no notification recipient configured".to_string()))?
            .to_string();

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("notify", %run_id, %symbol);
        async {
            let enrichment = self.run_stages(symbol).await?;
            let message = format_notification(
                symbol,
                &enrichment.recommendation,
                &enrichment.articles,
                &recipient,
            );
            let delivery_id = delivery.deliver(&message).await?;
            tracing::info!(
                channel = delivery.channel_name(),
                %delivery_id,
                "notification sent"
            );
            Ok::<_, anyhow::Error>(NotifyOutcome {
                symbol: symbol.clone(),
                action: enrichment.recommendation.action,
                delivery_id,
                recipient,
            })
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&self, symbol: &Symbol) -> anyhow::Result<Enrichment> {
        let articles = self
            .news
            .fetch_news(symbol.as_str(), self.news_window)
            .await?;
        if articles.is_empty() {
            tracing::warn!(
                provider = self.news.provider_name(),
                "no news articles; recommending without headlines"
            );
        }

        let financials = self.financials.fetch_financials(symbol).await?;

        let recommendation = self
            .engine
            .generate(symbol, &articles, &financials)
            .await?;

        Ok(Enrichment {
            symbol: symbol.clone(),
            recommendation,
            articles,
            financials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{classify, FailureKind, ProviderUnavailable, Stage};
    use crate::llm::prompt::NO_NEWS_FALLBACK;
    use crate::notify::format::HEADLINE_MARKER;
    use crate::testing::{FakeDelivery, FakeFinancials, FakeLlm, FakeNews};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    struct Fixture {
        news: Arc<FakeNews>,
        financials: Arc<FakeFinancials>,
        llm: Arc<FakeLlm>,
        delivery: Arc<FakeDelivery>,
    }

    impl Fixture {
        fn new(news: FakeNews, financials: FakeFinancials, llm: FakeLlm) -> Self {
            Self {
                news: Arc::new(news),
                financials: Arc::new(financials),
                llm: Arc::new(llm),
                delivery: Arc::new(FakeDelivery::new()),
            }
        }

        fn pipeline(&self) -> Pipeline {
            Pipeline::new(
                self.news.clone(),
                self.financials.clone(),
                RecommendationEngine::new(self.llm.clone()),
            )
            .with_delivery(self.delivery.clone(), Some("whatsapp:+15550001".to_string()))
        }
    }

    fn acme() -> Symbol {
        Symbol::parse("ACME").unwrap()
    }

    #[tokio::test]
    async fn enrich_scenario() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Q3 beats estimates", "New product launch"]),
            FakeFinancials::with(json!({"PERatio": "18.2", "EPS": ""})),
            FakeLlm::replying("Buy. Financials are strong..."),
        );

        let enrichment = fx.pipeline().enrich(&acme()).await.unwrap();
        assert_eq!(enrichment.recommendation.action, Action::Buy);
        assert_eq!(enrichment.articles.len(), 2);
        assert_eq!(enrichment.financials.len(), 2);

        let prompt = fx.llm.last_prompt().unwrap();
        assert!(prompt.contains("PERatio: 18.2"));
        assert!(!prompt.contains("EPS"));
    }

    #[tokio::test]
    async fn empty_news_is_not_fatal() {
        let fx = Fixture::new(
            FakeNews::with_titles(&[]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Hold, given limited news."),
        );

        let enrichment = fx.pipeline().enrich(&acme()).await.unwrap();
        assert!(enrichment.articles.is_empty());
        assert_eq!(enrichment.recommendation.action, Action::Hold);
        assert!(fx.llm.last_prompt().unwrap().contains(NO_NEWS_FALLBACK));
    }

    #[tokio::test]
    async fn unparseable_response_still_succeeds() {
        let text = "Mixed signals across the board.";
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying(text),
        );

        let enrichment = fx.pipeline().enrich(&acme()).await.unwrap();
        assert_eq!(enrichment.recommendation.action, Action::Unknown);
        assert_eq!(enrichment.recommendation.rationale, text);
    }

    #[tokio::test]
    async fn financials_failure_aborts_before_inference() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::failing(),
            FakeLlm::replying("Buy"),
        );
        let pipeline = fx.pipeline();

        let err = pipeline.enrich(&acme()).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::Upstream(Stage::Financials));

        let err = pipeline.notify(&acme(), None).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::Upstream(Stage::Financials));

        assert_eq!(fx.llm.calls(), 0);
        assert!(fx.delivery.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn news_transport_failure_aborts() {
        let fx = Fixture::new(
            FakeNews::failing(),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Buy"),
        );

        let err = fx.pipeline().enrich(&acme()).await.unwrap_err();
        let unavailable = err.downcast_ref::<ProviderUnavailable>().unwrap();
        assert_eq!(unavailable.stage, Stage::News);
        assert_eq!(fx.financials.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.llm.calls(), 0);
    }

    #[tokio::test]
    async fn inference_failure_aborts_notify() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::failing(),
        );

        let err = fx.pipeline().notify(&acme(), None).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::Upstream(Stage::Inference));
        assert!(fx.delivery.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notify_sends_digest_of_three_and_returns_real_id() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["A1", "A2", "A3", "A4", "A5", "A6"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Sell. Weak margins."),
        );
        let pipeline = fx.pipeline();

        let outcome = pipeline.notify(&acme(), None).await.unwrap();
        assert_eq!(outcome.delivery_id, "SM0001");
        assert_eq!(outcome.action, Action::Sell);
        assert_eq!(outcome.recipient, "whatsapp:+15550001");

        let sent = fx.delivery.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headline_digest, vec!["A1", "A2", "A3"]);
        assert_eq!(sent[0].body.matches(HEADLINE_MARKER).count(), 3);
        assert!(!sent[0].body.contains("A4"));

        // The prompt still saw five titles.
        assert_eq!(fx.llm.last_prompt().unwrap().matches("- A").count(), 5);
    }

    #[tokio::test]
    async fn repeated_notify_sends_duplicates() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Hold"),
        );
        let pipeline = fx.pipeline();

        let first = pipeline.notify(&acme(), Some("whatsapp:+15550002")).await.unwrap();
        let second = pipeline.notify(&acme(), Some("whatsapp:+15550002")).await.unwrap();
        assert_ne!(first.delivery_id, second.delivery_id);
        assert_eq!(fx.delivery.sent.lock().unwrap().len(), 2);
        assert_eq!(first.recipient, "whatsapp:+15550002");
    }

    #[tokio::test]
    async fn notify_without_channel_or_recipient() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Hold"),
        );

        let no_channel = Pipeline::new(
            fx.news.clone(),
            fx.financials.clone(),
            RecommendationEngine::new(fx.llm.clone()),
        );
        assert!(!no_channel.delivery_enabled());
        let err = no_channel.notify(&acme(), None).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::NotConfigured);

        let no_recipient = Pipeline::new(
            fx.news.clone(),
            fx.financials.clone(),
            RecommendationEngine::new(fx.llm.clone()),
        )
        .with_delivery(fx.delivery.clone(), None);
        let err = no_recipient.notify(&acme(), Some("  ")).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::InvalidInput);

        assert_eq!(fx.news.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.llm.calls(), 0);
    }

    #[tokio::test]
    async fn delivery_failure_surfaces() {
        let fx = Fixture::new(
            FakeNews::with_titles(&["Story"]),
            FakeFinancials::with(json!({"PERatio": "18.2"})),
            FakeLlm::replying("Buy"),
        );
        let pipeline = Pipeline::new(
            fx.news.clone(),
            fx.financials.clone(),
            RecommendationEngine::new(fx.llm.clone()),
        )
        .with_delivery(Arc::new(FakeDelivery::failing()), Some("whatsapp:+1".to_string()));

        let err = pipeline.notify(&acme(), None).await.unwrap_err();
        assert_eq!(classify(&err), FailureKind::Upstream(Stage::Delivery));
    }

    #[test]
    fn from_settings_without_twilio_disables_notify() {
        let settings = Settings {
            news_api_key: Some("n".to_string()),
            fin_api_key: Some("f".to_string()),
            openai_api_key: Some("o".to_string()),
            ..Default::default()
        };
        let pipeline = Pipeline::from_settings(&settings).unwrap();
        assert!(!pipeline.delivery_enabled());

        let settings = Settings {
            twilio_account_sid: Some("AC1".to_string()),
            twilio_auth_token: Some("t".to_string()),
            twilio_whatsapp_number: Some("whatsapp:+1".to_string()),
            ..settings
        };
        assert!(Pipeline::from_settings(&settings).unwrap().delivery_enabled());
    }
}

//! # Inbound Ports (Driving Ports)
//!
//! The command surface an API layer drives. Each method maps one-to-one to a
//! lifecycle operation.

use crate::domain::{
    CancellationReport, CompleteMatch, MatchUpdate, RecordResult, ReportResult,
    ValidationDecision,
};
use async_trait::async_trait;
use shared_types::{
    Match, MatchFilter, MatchId, MatchPage, MatchResult, NewMatch, PlayerResult, TournamentId,
};

/// Lifecycle command and query API.
#[async_trait]
pub trait MatchLifecycleApi: Send + Sync {
    async fn create(&self, new: NewMatch) -> MatchResult<Match>;

    async fn get(&self, id: MatchId) -> MatchResult<Match>;

    /// `page` and `page_size` are normalized against the pagination policy.
    async fn list(
        &self,
        filter: MatchFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> MatchResult<MatchPage>;

    async fn update(&self, id: MatchId, update: MatchUpdate) -> MatchResult<Match>;

    async fn start(&self, id: MatchId) -> MatchResult<Match>;

    async fn report_result(&self, id: MatchId, report: ReportResult) -> MatchResult<Match>;

    async fn validate_result(
        &self,
        id: MatchId,
        decision: ValidationDecision,
    ) -> MatchResult<Match>;

    async fn complete(&self, id: MatchId, complete: CompleteMatch) -> MatchResult<Match>;

    async fn cancel(&self, id: MatchId, reason: Option<String>) -> MatchResult<Match>;

    async fn delete(&self, id: MatchId) -> MatchResult<()>;

    async fn record_player_result(
        &self,
        match_id: MatchId,
        record: RecordResult,
    ) -> MatchResult<PlayerResult>;

    async fn list_player_results(&self, match_id: MatchId) -> MatchResult<Vec<PlayerResult>>;

    async fn cancel_open_matches(
        &self,
        tournament_id: TournamentId,
        reason: Option<String>,
    ) -> MatchResult<CancellationReport>;
}

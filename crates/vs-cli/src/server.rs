use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;
use vs_core::{
    CachedSimulator, SimulationConfig, build_marginal, canonical_regions, compute_bonus,
    compute_vote_share, marginal_from_value, region_code, scenario_from_value,
    segment_preference, simulate, tally_electoral,
};
use vs_store::{Config, Store};

#[derive(Clone)]
pub struct VsServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    store: Store,
    simulation: SimulationConfig,
    units: BTreeMap<String, u32>,
}

impl VsServer {
    pub fn new(store: Store, config: &Config) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                store,
                simulation: config.simulation(),
                units: config.effective_units(),
            })),
            tool_router: Self::tool_router(),
        }
    }
}

fn pretty(value: &impl serde::Serialize) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )])
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct MarginalRequest {
    /// Normalized recognition in [0, 1]
    recognition: f64,
    /// Favorability in [-1, 1]
    favorability: f64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct BonusRequest {
    /// Similarity of entity A to the segment profile, [0, 1]
    similarity_a: f64,
    /// Similarity of entity B to the segment profile, [0, 1]
    similarity_b: f64,
    /// Tilt multiplier; defaults to the configured value
    multiplier: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct VoteShareRequest {
    /// Marginal for A: {"favorable","neutral","unfavorable","unknown"} or a 4-element array
    marginal_a: serde_json::Value,
    /// Marginal for B, same shape as marginal_a
    marginal_b: serde_json::Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SimulateRequest {
    /// Scenario: {"entityA", "entityB", "regions": {REGION: [segments]}, "units"?, "favorability"?}
    scenario: serde_json::Value,
    /// Skip the result cache
    #[serde(default)]
    no_cache: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct TallyRequest {
    /// Region → winning entity, or null for an undecided region
    winners: BTreeMap<String, Option<String>>,
    /// Unit table; defaults to the configured table
    units: Option<BTreeMap<String, u32>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UnitsRequest {
    /// Region code such as "CA"; omit for the whole table
    region: Option<String>,
}

#[tool_router]
impl VsServer {
    #[tool(
        description = "Build the four-category attitude marginal (favorable, neutral, unfavorable, unknown) for one entity from normalized recognition and favorability."
    )]
    async fn vs_marginal(
        &self,
        Parameters(req): Parameters<MarginalRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(pretty(&build_marginal(req.recognition, req.favorability)))
    }

    #[tool(
        description = "Compute the zero-sum favorability tilt from two demographic similarity scores, plus which side the segment leans to."
    )]
    async fn vs_bonus(
        &self,
        Parameters(req): Parameters<BonusRequest>,
    ) -> Result<CallToolResult, McpError> {
        let multiplier = match req.multiplier {
            Some(m) => m,
            None => self.state.lock().await.simulation.bonus_multiplier,
        };
        let bonus = compute_bonus(Some(req.similarity_a), Some(req.similarity_b), multiplier);
        let result = serde_json::json!({
            "bonusA": bonus.a,
            "bonusB": bonus.b,
            "preference": segment_preference(req.similarity_a, req.similarity_b),
        });
        Ok(pretty(&result))
    }

    #[tool(
        description = "Combine two attitude marginals through the outcome table. Returns vote shares among decided voters and the turnout fraction."
    )]
    async fn vs_vote_share(
        &self,
        Parameters(req): Parameters<VoteShareRequest>,
    ) -> Result<CallToolResult, McpError> {
        let marginal_a = marginal_from_value(req.marginal_a)
            .map_err(|e| McpError::invalid_params(format!("marginal_a: {e}"), None))?;
        let marginal_b = marginal_from_value(req.marginal_b)
            .map_err(|e| McpError::invalid_params(format!("marginal_b: {e}"), None))?;
        Ok(pretty(&compute_vote_share(&marginal_a, &marginal_b)))
    }

    #[tool(
        description = "Simulate a full head-to-head: per-region vote shares and winners, a national segment breakdown, and the winner-take-all unit tally. Results are cached; a cached run of the swapped contest is mirrored."
    )]
    async fn vs_simulate(
        &self,
        Parameters(req): Parameters<SimulateRequest>,
    ) -> Result<CallToolResult, McpError> {
        let scenario = scenario_from_value(req.scenario)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let mut state = self.state.lock().await;
        let ServerState {
            store,
            simulation,
            units,
        } = &mut *state;

        let (result, source, key) = if req.no_cache {
            (simulate(&scenario, simulation, units), None, None)
        } else {
            let outcome = CachedSimulator::new(store, simulation, units).run(&scenario);
            (outcome.result, Some(outcome.source), Some(outcome.key))
        };

        for region in result.low_confidence_regions() {
            tracing::warn!("region {region}: no decided votes, reporting 50/50 fallback");
        }

        let json = serde_json::json!({
            "source": source,
            "cacheKey": key,
            "result": result,
        });
        Ok(pretty(&json))
    }

    #[tool(
        description = "Tally region winners into per-entity unit totals and a national winner. Regions without a winner or without a unit count add nothing."
    )]
    async fn vs_tally(
        &self,
        Parameters(req): Parameters<TallyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let invalid = |e: vs_core::InputError| McpError::invalid_params(e.to_string(), None);
        let winners = canonical_regions(req.winners).map_err(invalid)?;
        let units = req.units.map(canonical_regions).transpose().map_err(invalid)?;

        let state = self.state.lock().await;
        let units = units.as_ref().unwrap_or(&state.units);
        let tally = tally_electoral(&winners, units, state.simulation.tie_break);
        Ok(pretty(&tally))
    }

    #[tool(description = "Look up electoral units for one region, or list the whole table.")]
    async fn vs_units(
        &self,
        Parameters(req): Parameters<UnitsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let Some(region) = req.region else {
            let total: u32 = state.units.values().sum();
            return Ok(pretty(&serde_json::json!({
                "units": state.units,
                "total": total,
            })));
        };
        let code = region_code(&region);
        let count = state.units.get(&code).ok_or_else(|| {
            McpError::invalid_params(format!("unknown region '{region}'"), None)
        })?;
        Ok(pretty(&serde_json::json!({ "region": code, "units": count })))
    }

    #[tool(description = "Show result cache statistics: entry count, fresh and expired entries, TTL.")]
    async fn vs_cache_stats(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let stats = state
            .store
            .stats()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(pretty(&stats))
    }

    #[tool(description = "Remove cached results older than the configured TTL. Fresh entries stay.")]
    async fn vs_cache_purge(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let removed = state
            .store
            .purge()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(pretty(&serde_json::json!({ "purged": removed })))
    }

    #[tool(description = "Remove every cached simulation result.")]
    async fn vs_cache_clear(&self) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let removed = state
            .store
            .clear()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(pretty(&serde_json::json!({ "removed": removed })))
    }
}

#[tool_handler]
impl ServerHandler for VsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Deterministic head-to-head vote-share simulation between two entities.\n\n\
                 Use vs_simulate with a scenario of per-region demographic segments \
                 (recognition, favorability, population share, optional similarity or raw \
                 cosineA/cosineB) to get \
                 region winners, a national breakdown and the electoral unit tally. \
                 vs_marginal, vs_bonus and vs_vote_share expose the individual steps. \
                 Regions flagged lowConfidence had no decided votes and report 50/50."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

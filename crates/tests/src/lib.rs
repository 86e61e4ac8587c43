//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! - Config snapshot tests
//! - Handlers wired through the dispatcher (mock HTTP, temp output dirs)

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::PluginConfig;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = PluginConfig::default();
        let toml = ConfigLoader::to_toml(&config).unwrap();
        let parsed = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

        assert_eq!(parsed.output_directory, config.output_directory);
        assert_eq!(parsed.swarfarm.api_url, "https://swarfarm.com/api/v2");
        assert_eq!(parsed.swag.upload_url, "https://gw.swop.one/data/upload/");
        assert_eq!(parsed.job_poll.max_attempts, 3);
        assert_eq!(parsed.job_poll.interval_secs, 10);
        assert_eq!(parsed.dispatcher.queue_capacity, 100);
        assert!(!parsed.debug_output.enabled);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use contracts::{ApiEvent, JobPollConfig, SwagConfig, SwarfarmConfig};
    use dispatcher::{DebugOutput, DispatcherBuilder, DispatcherConfig};
    use observability::MetricsSummary;
    use profile_export::ProfileExporter;
    use serde_json::{json, Value};
    use siege_export::SiegeExporter;
    use swarfarm::{SwagForwarder, SwarfarmUploader, TokenStore};
    use tokio::sync::mpsc;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WIZARD_ID: i64 = 1001;

    fn event(command: &str, request: Value, response: Value) -> ApiEvent {
        ApiEvent::new(command, request.to_string(), response.to_string())
    }

    fn login_event() -> ApiEvent {
        event(
            "HubUserLogin",
            json!({"wizard_id": WIZARD_ID}),
            json!({
                "wizard_info": {"wizard_id": WIZARD_ID, "wizard_name": "Tester"},
                "building_list": [
                    {"building_id": 50, "building_master_id": 25},
                    {"building_id": 51, "building_master_id": 1}
                ],
                "unit_list": [
                    {"unit_id": 1, "building_id": 50, "unit_level": 40, "class": 6, "attribute": 1},
                    {"unit_id": 2, "building_id": 0, "unit_level": 35, "class": 5, "attribute": 2},
                    {"unit_id": 3, "building_id": 0, "unit_level": 40, "class": 6, "attribute": 3}
                ],
                "rune_craft_item_list": [
                    {"craft_type": 2, "craft_item_id": 5},
                    {"craft_type": 1, "craft_item_id": 9},
                    {"craft_type": 2, "craft_item_id": 1}
                ]
            }),
        )
    }

    fn dungeon_event() -> ApiEvent {
        event(
            "BattleDungeonResult",
            json!({"wizard_id": WIZARD_ID, "dungeon_id": 8001, "session_key": "drop-me"}),
            json!({"win_lose": 1, "reward": {"crate": {}}}),
        )
    }

    async fn mount_swarfarm(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/data_logs/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "BattleDungeonResult": {"request": ["wizard_id", "dungeon_id"], "response": ["win_lose"]},
                "__meta": {"request": ["x"]}
            })))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/data_logs/"))
            .and(body_json(json!({
                "data": {
                    "request": {"wizard_id": WIZARD_ID, "dungeon_id": 8001},
                    "response": {"win_lose": 1}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .and(header("Authorization", "Token tok-1001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-7"})))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/upload/job-7/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .mount(server)
            .await;
    }

    fn uploader(server: &MockServer) -> SwarfarmUploader {
        let config = SwarfarmConfig {
            api_url: server.uri(),
            livesync_enabled: false,
            ..Default::default()
        };
        let tokens = Arc::new(TokenStore::from_pairs([("1001", "tok-1001")]));
        SwarfarmUploader::from_config(&config, &JobPollConfig::default(), tokens).unwrap()
    }

    async fn run_events(
        builder: DispatcherBuilder,
        events: Vec<ApiEvent>,
        tx: mpsc::Sender<ApiEvent>,
    ) -> MetricsSummary {
        let dispatcher = builder.build().unwrap();
        let handle = dispatcher.spawn();
        for event in events {
            tx.send(event).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap()
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    /// Login + data log + siege events through every handler
    #[tokio::test]
    async fn test_e2e_all_handlers() {
        let server = MockServer::start().await;
        mount_swarfarm(&server).await;
        let dir = tempfile::tempdir().unwrap();

        let (tx, rx) = mpsc::channel(16);
        let builder = DispatcherBuilder::new(DispatcherConfig::default(), rx)
            .handler(ProfileExporter::new(dir.path()).unwrap())
            .handler(SiegeExporter::new(dir.path()).unwrap())
            .handler(uploader(&server))
            .handler(DebugOutput::new());

        let events = vec![
            login_event(),
            dungeon_event(),
            event(
                "GetGuildSiegeMatchupInfo",
                json!({"wizard_id": WIZARD_ID}),
                json!({"ret_code": 0, "match_info": {"match_id": 42}}),
            ),
            event(
                "GetGuildSiegeBattleLog",
                json!({"wizard_id": WIZARD_ID, "log_type": 1}),
                json!({"log_list": [{"guild_info_list": [{"match_id": 42}]}]}),
            ),
        ];
        let summary = run_events(builder, events, tx).await;

        // profile: storage unit last, craft items by type asc then id desc
        let profile = read(&dir.path().join("Tester-1001.json"));
        let unit_ids: Vec<_> = profile["unit_list"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["unit_id"].as_i64().unwrap())
            .collect();
        assert_eq!(unit_ids, vec![3, 2, 1]);
        assert_eq!(
            profile["rune_craft_item_list"],
            json!([
                {"craft_type": 1, "craft_item_id": 9},
                {"craft_type": 2, "craft_item_id": 5},
                {"craft_type": 2, "craft_item_id": 1}
            ])
        );

        let siege = read(&dir.path().join("SiegeMatch-42.json"));
        assert!(siege.get("matchup_info").is_some());
        assert!(siege.get("attack_log").is_some());
        assert_eq!(siege["wizard_id"], json!(WIZARD_ID));

        assert_eq!(summary.total_events, 4);
        let swarfarm = summary.handlers.iter().find(|h| h.name == "swarfarm").unwrap();
        assert_eq!((swarfarm.handled, swarfarm.ignored, swarfarm.failed), (2, 2, 0));
        let debug = summary.handlers.iter().find(|h| h.name == "debug_output").unwrap();
        assert_eq!(debug.handled, 4);
        // wiremock verifies the expected request counts on drop
    }

    /// A failing handler never stops the others
    #[tokio::test]
    async fn test_e2e_failure_isolation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();

        let (tx, rx) = mpsc::channel(16);
        let builder = DispatcherBuilder::new(DispatcherConfig::default(), rx)
            .handler(ProfileExporter::new(dir.path()).unwrap())
            .handler(uploader(&server));

        let malformed = ApiEvent::new("HubUserLogin", "{}", "{not json");
        let summary = run_events(builder, vec![malformed, login_event()], tx).await;

        assert!(dir.path().join("Tester-1001.json").exists());
        let profile = summary.handlers.iter().find(|h| h.name == "profile_export").unwrap();
        assert_eq!((profile.handled, profile.failed), (1, 1));
        let swarfarm = summary.handlers.iter().find(|h| h.name == "swarfarm").unwrap();
        assert_eq!(swarfarm.failed, 2);
    }

    /// Guild war logs are forwarded anonymously and untouched
    #[tokio::test]
    async fn test_e2e_swag_forwarding() {
        let server = MockServer::start().await;
        let response = r#"{"log_list":[{"battle_id":9}],"ret_code":0}"#;
        Mock::given(method("POST"))
            .and(path("/data/upload/"))
            .and(wiremock::matchers::body_string(response))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let swag = SwagForwarder::from_config(
            &SwagConfig {
                enabled: true,
                upload_url: format!("{}/data/upload/", server.uri()),
            },
            std::time::Duration::from_secs(5),
        )
        .unwrap();

        let (tx, rx) = mpsc::channel(4);
        let builder = DispatcherBuilder::new(DispatcherConfig::default(), rx).handler(swag);
        let events = vec![
            ApiEvent::new("GetGuildWarBattleLogByGuildId", r#"{"wizard_id":3}"#, response),
            ApiEvent::new("HubUserLogin", "{}", "{}"),
        ];
        let summary = run_events(builder, events, tx).await;

        let swag = &summary.handlers[0];
        assert_eq!((swag.handled, swag.ignored), (1, 1));
    }

    /// Siege defense list for a headquarters base carries the whole document
    #[tokio::test]
    async fn test_e2e_siege_defense_list() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(8);
        let builder = DispatcherBuilder::new(DispatcherConfig { queue_capacity: 8 }, rx)
            .handler(SiegeExporter::new(dir.path()).unwrap());

        let events = vec![
            event(
                "GetGuildSiegeMatchupInfo",
                json!({"wizard_id": 5}),
                json!({"ret_code": 0, "match_info": {"match_id": 7}}),
            ),
            event(
                "GetGuildSiegeBaseDefenseUnitList",
                json!({"wizard_id": 5, "base_number": 3}),
                json!({"defense_unit_list": [1]}),
            ),
            event(
                "GetGuildSiegeBaseDefenseUnitListPreset",
                json!({"wizard_id": 5, "base_number": 14}),
                json!({"defense_unit_list": [2]}),
            ),
        ];
        run_events(builder, events, tx).await;

        let defense = read(&dir.path().join("SiegeDefenseList.json"));
        assert_eq!(defense["defense_list"]["hq_base_number"], json!(14));
        assert_eq!(defense["defense_list"]["defense_unit_list"], json!([2]));
        assert_eq!(defense["matchup_info"]["match_info"]["match_id"], json!(7));
    }
}

use claim_config::ClaimConfig;
use figment::Jail;

#[test]
fn env_vars_override_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("CLAIMCHECK_CACHE__TTL_SECS", "90");
        jail.set_env("CLAIMCHECK_VERIFICATION__SKIP_NEGATIVE_SEQUENCE", "true");

        let config = ClaimConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.cache.ttl_secs, 90);
        assert!(config.verification.skip_negative_sequence);
        Ok(())
    });
}

#[test]
fn env_vars_beat_project_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".claimcheck")?;
        jail.create_file(
            ".claimcheck/config.toml",
            r#"
[sources.twitter]
sequence = 3
"#,
        )?;
        jail.set_env("CLAIMCHECK_SOURCES__TWITTER__SEQUENCE", "-1");

        let config = ClaimConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.sources["twitter"].sequence, Some(-1));
        Ok(())
    });
}

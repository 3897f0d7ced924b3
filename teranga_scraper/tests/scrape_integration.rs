use std::sync::Arc;

use chrono::NaiveDate;
use teranga_scraper::{FetchClient, FixedPolicy, ProfileScraper, ScrapeError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn scraper_for(server: &MockServer) -> ProfileScraper {
    let policy = Arc::new(FixedPolicy);
    let client = FetchClient::new(policy.clone()).unwrap();
    ProfileScraper::with_base_url(client, policy, &server.uri())
}

#[tokio::test]
async fn fetch_profile_resolves_every_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sadio-mane/profil/spieler/200512"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("profile_full.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fc-dakar/startseite/verein/9911"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("club_page.html")))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let profile = scraper.fetch_profile(&url).await.unwrap();

    assert_eq!(profile.name.as_deref(), Some("Sadio Mané"));
    assert_eq!(profile.birth_date, NaiveDate::from_ymd_opt(1992, 4, 10));
    assert_eq!(profile.nationality.as_deref(), Some("Sénégal"));
    assert_eq!(
        profile.position.as_deref(),
        Some("Position: Attaquant - Ailier gauche")
    );
    assert_eq!(profile.current_club.as_deref(), Some("FC Dakar"));
    assert_eq!(profile.current_competition.as_deref(), Some("Ligue 1 Sénégal"));
    assert_eq!(profile.competition_country.as_deref(), Some("Sénégal"));
}

#[tokio::test]
async fn club_context_is_fetched_once_per_club() {
    let mock_server = MockServer::start().await;

    for player in ["/a/profil/spieler/1", "/b/profil/spieler/2"] {
        Mock::given(method("GET"))
            .and(path(player))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(load_fixture("profile_full.html")),
            )
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/fc-dakar/startseite/verein/9911"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("club_page.html")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let first = scraper
        .fetch_profile(&format!("{}/a/profil/spieler/1", mock_server.uri()))
        .await
        .unwrap();
    let second = scraper
        .fetch_profile(&format!("{}/b/profil/spieler/2", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(first.current_competition, second.current_competition);
    assert_eq!(second.competition_country.as_deref(), Some("Sénégal"));
}

#[tokio::test]
async fn country_comes_from_the_competition_page_when_the_club_shows_no_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sadio-mane/profil/spieler/200512"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("profile_full.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fc-dakar/startseite/verein/9911"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("club_no_flag.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/super-lig/startseite/wettbewerb/TR1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(load_fixture("competition_page.html")),
        )
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let profile = scraper.fetch_profile(&url).await.unwrap();

    assert_eq!(profile.current_competition.as_deref(), Some("Süper Lig"));
    assert_eq!(profile.competition_country.as_deref(), Some("Turquie"));
}

#[tokio::test]
async fn unreachable_club_page_degrades_to_missing_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sadio-mane/profil/spieler/200512"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("profile_full.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fc-dakar/startseite/verein/9911"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let profile = scraper.fetch_profile(&url).await.unwrap();

    assert_eq!(profile.current_club.as_deref(), Some("FC Dakar"));
    assert_eq!(profile.current_competition, None);
    assert_eq!(profile.competition_country, None);
}

#[tokio::test]
async fn transient_error_is_retried_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sadio-mane/profil/spieler/200512"))
        .respond_with(ResponseTemplate::new(503).set_body_string("throttled"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sadio-mane/profil/spieler/200512"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("profile_full.html")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fc-dakar/startseite/verein/9911"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("club_page.html")))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let profile = scraper.fetch_profile(&url).await.unwrap();

    assert_eq!(profile.name.as_deref(), Some("Sadio Mané"));
}

#[tokio::test]
async fn persistent_error_exhausts_every_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone/profil/spieler/404404"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/gone/profil/spieler/404404", mock_server.uri());
    let result = scraper.fetch_profile(&url).await;

    match result {
        Err(ScrapeError::Unavailable { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected Unavailable, got {:?}", other.map(|p| p.name)),
    }
}

#[tokio::test]
async fn missing_page_fails_without_retrying() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone/profil/spieler/404404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("introuvable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/gone/profil/spieler/404404", mock_server.uri());
    let result = scraper.fetch_profile(&url).await;

    assert!(matches!(result, Err(ScrapeError::Fetch(_))));
}

#[tokio::test]
async fn career_totals_come_from_the_footer_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/sadio-mane/leistungsdatendetails/spieler/200512\
             /saison//verein/0/liga/0/wettbewerb//pos/0/trainer_id/0/plus/1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("stats_career.html")))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let totals = scraper.fetch_totals(&url, None).await.unwrap().unwrap();

    assert_eq!(totals.matches, 301);
    assert_eq!(totals.goals, 111);
    assert_eq!(totals.assists, 41);
    assert_eq!(totals.minutes_played, 301 * 90);
}

#[tokio::test]
async fn season_totals_fall_back_to_row_sums() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/sadio-mane/leistungsdatendetails/spieler/200512\
             /saison/2024/verein/0/liga/0/wettbewerb//pos/0/trainer_id/0/plus/1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("stats_tbody.html")))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let totals = scraper
        .fetch_totals(&url, Some("2024"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(totals.matches, 22);
    assert_eq!(totals.goals, 9);
    assert_eq!(totals.assists, 4);
}

#[tokio::test]
async fn stats_page_without_a_table_yields_no_totals() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/sadio-mane/leistungsdatendetails/spieler/200512\
             /saison//verein/0/liga/0/wettbewerb//pos/0/trainer_id/0/plus/1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("stats_empty.html")))
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let url = format!("{}/sadio-mane/profil/spieler/200512", mock_server.uri());
    let totals = scraper.fetch_totals(&url, None).await.unwrap();

    assert_eq!(totals, None);
}

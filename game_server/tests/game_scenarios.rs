mod support;

use serde_json::json;
use support::TestClient;

#[tokio::test]
async fn happy_path_of_two_players() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice"})).await;
    assert_eq!(alice.recv_type("REGISTER_OK").await["username"], "Alice");

    bob.send(json!({"type": "REGISTER", "username": "Bob"})).await;
    assert_eq!(bob.recv_type("REGISTER_OK").await["username"], "Bob");

    alice
        .send(json!({
            "type": "CREATE_GAME",
            "theme": "Math",
            "isPublic": true,
            "maxPlayers": 10
        }))
        .await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().expect("pin present").to_string();
    assert_eq!(pin.len(), 6);

    bob.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    let joined = bob.recv_type("JOINED_GAME").await;
    let players: Vec<&str> = joined["game"]["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(players, vec!["Alice", "Bob"]);

    let player_joined = alice.recv_type("PLAYER_JOINED").await;
    assert_eq!(player_joined["pin"], pin);

    alice
        .send(json!({"type": "SUBMIT_QUESTION", "pin": pin, "question": "2+2=4", "answerTrue": true}))
        .await;
    alice.recv_type("QUESTION_SUBMITTED").await;
    bob.recv_type("QUESTION_SUBMITTED").await;

    alice.send(json!({"type": "START_GAME", "pin": pin})).await;
    alice.recv_type("GAME_STARTED").await;
    bob.recv_type("GAME_STARTED").await;

    bob.send(json!({"type": "ANSWER", "pin": pin, "correct": true})).await;
    let score_alice = alice.recv_type("SCORE_UPDATE").await;
    let score_bob = bob.recv_type("SCORE_UPDATE").await;
    assert_eq!(score_alice["game"]["scores"]["Alice"], 0);
    assert_eq!(score_alice["game"]["scores"]["Bob"], 100);
    assert_eq!(score_bob["duplicate"], false);

    alice.send(json!({"type": "NEXT_QUESTION", "pin": pin})).await;
    let ended_alice = alice.recv_type("GAME_ENDED").await;
    let ended_bob = bob.recv_type("GAME_ENDED").await;
    assert_eq!(ended_alice["game"]["state"], "ended");
    assert_eq!(ended_bob["game"]["state"], "ended");
}

#[tokio::test]
async fn non_host_start_is_rejected() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice2"})).await;
    alice.recv_type("REGISTER_OK").await;
    bob.send(json!({"type": "REGISTER", "username": "Bob2"})).await;
    bob.recv_type("REGISTER_OK").await;

    alice.send(json!({"type": "CREATE_GAME", "theme": "Trivia"})).await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    bob.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    bob.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;

    bob.send(json!({"type": "START_GAME", "pin": pin})).await;
    let err = bob.recv_type("ERROR").await;
    assert_eq!(err["message"], "Only host can start");
}

#[tokio::test]
async fn start_with_no_questions_is_rejected() {
    let mut alice = TestClient::connect().await;
    alice.send(json!({"type": "REGISTER", "username": "Alice3"})).await;
    alice.recv_type("REGISTER_OK").await;

    alice.send(json!({"type": "CREATE_GAME", "theme": "Empty"})).await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    alice.send(json!({"type": "START_GAME", "pin": pin})).await;
    let err = alice.recv_type("ERROR").await;
    assert_eq!(err["message"], "Add at least 1 question before starting");
}

#[tokio::test]
async fn double_answer_only_scores_once() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice4"})).await;
    alice.recv_type("REGISTER_OK").await;
    bob.send(json!({"type": "REGISTER", "username": "Bob4"})).await;
    bob.recv_type("REGISTER_OK").await;

    alice.send(json!({"type": "CREATE_GAME", "theme": "Dup"})).await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    bob.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    bob.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;

    alice
        .send(json!({"type": "SUBMIT_QUESTION", "pin": pin, "question": "q1", "answerTrue": true}))
        .await;
    alice.recv_type("QUESTION_SUBMITTED").await;
    bob.recv_type("QUESTION_SUBMITTED").await;

    alice.send(json!({"type": "START_GAME", "pin": pin})).await;
    alice.recv_type("GAME_STARTED").await;
    bob.recv_type("GAME_STARTED").await;

    bob.send(json!({"type": "ANSWER", "pin": pin, "correct": true})).await;
    alice.recv_type("SCORE_UPDATE").await;
    let first = bob.recv_type("SCORE_UPDATE").await;
    assert_eq!(first["duplicate"], false);
    assert_eq!(first["game"]["scores"]["Bob4"], 100);

    bob.send(json!({"type": "ANSWER", "pin": pin, "correct": true})).await;
    alice.recv_type("SCORE_UPDATE").await;
    let second = bob.recv_type("SCORE_UPDATE").await;
    assert_eq!(second["duplicate"], true);
    assert_eq!(second["game"]["scores"]["Bob4"], 100);
}

#[tokio::test]
async fn host_leaving_lobby_promotes_next_host() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;
    let mut carol = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice5"})).await;
    alice.recv_type("REGISTER_OK").await;
    bob.send(json!({"type": "REGISTER", "username": "Bob5"})).await;
    bob.recv_type("REGISTER_OK").await;
    carol.send(json!({"type": "REGISTER", "username": "Carol5"})).await;
    carol.recv_type("REGISTER_OK").await;

    alice.send(json!({"type": "CREATE_GAME", "theme": "Leave"})).await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    bob.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    bob.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;

    carol.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    carol.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;
    bob.recv_type("PLAYER_JOINED").await;

    alice.send(json!({"type": "EXIT_GAME", "pin": pin})).await;
    let left_bob = bob.recv_type("PLAYER_LEFT").await;
    carol.recv_type("PLAYER_LEFT").await;

    let host = left_bob["game"]["host"].as_str().unwrap();
    assert!(host == "Bob5" || host == "Carol5");
    assert_eq!(left_bob["game"]["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_games_only_returns_public_lobbies() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice6"})).await;
    alice.recv_type("REGISTER_OK").await;
    bob.send(json!({"type": "REGISTER", "username": "Bob6"})).await;
    bob.recv_type("REGISTER_OK").await;

    alice
        .send(json!({"type": "CREATE_GAME", "theme": "Public", "isPublic": true}))
        .await;
    let created_public = alice.recv_type("GAME_CREATED").await;
    let public_pin = created_public["game"]["pin"].as_str().unwrap().to_string();

    bob.send(json!({"type": "CREATE_GAME", "theme": "Private", "isPublic": false}))
        .await;
    let created_private = bob.recv_type("GAME_CREATED").await;
    let private_pin = created_private["game"]["pin"].as_str().unwrap().to_string();

    alice.send(json!({"type": "LIST_GAMES"})).await;
    let games = alice.recv_type("GAMES_LIST").await;
    let pins: Vec<&str> = games["games"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["pin"].as_str().unwrap())
        .collect();
    assert!(pins.contains(&public_pin.as_str()));
    assert!(!pins.contains(&private_pin.as_str()));
}

#[tokio::test]
async fn create_game_and_submit_question_before_register_are_rejected() {
    let mut alice = TestClient::connect().await;

    alice
        .send(json!({"type": "CREATE_GAME", "theme": "TooEarly", "username": "Ghost"}))
        .await;
    let err = alice.recv_type("ERROR").await;
    assert!(err["message"].as_str().unwrap().contains("REGISTER"));

    alice
        .send(json!({
            "type": "SUBMIT_QUESTION",
            "pin": "000000",
            "question": "2+2=4",
            "answerTrue": true,
            "username": "Ghost"
        }))
        .await;
    let err = alice.recv_type("ERROR").await;
    assert!(err["message"].as_str().unwrap().contains("REGISTER"));
}

#[tokio::test]
async fn concurrent_broadcasts_are_consistently_ordered_across_observers() {
    let mut alice = TestClient::connect().await;
    let mut bob = TestClient::connect().await;
    let mut carol = TestClient::connect().await;
    let mut dave = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "AliceOrd"})).await;
    alice.recv_type("REGISTER_OK").await;
    bob.send(json!({"type": "REGISTER", "username": "BobOrd"})).await;
    bob.recv_type("REGISTER_OK").await;
    carol.send(json!({"type": "REGISTER", "username": "CarolOrd"})).await;
    carol.recv_type("REGISTER_OK").await;
    dave.send(json!({"type": "REGISTER", "username": "DaveOrd"})).await;
    dave.recv_type("REGISTER_OK").await;

    alice
        .send(json!({"type": "CREATE_GAME", "theme": "Order", "isPublic": true}))
        .await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    bob.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    bob.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;

    carol.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    carol.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;
    bob.recv_type("PLAYER_JOINED").await;

    dave.send(json!({"type": "JOIN_GAME", "pin": pin})).await;
    dave.recv_type("JOINED_GAME").await;
    alice.recv_type("PLAYER_JOINED").await;
    bob.recv_type("PLAYER_JOINED").await;
    carol.recv_type("PLAYER_JOINED").await;

    // Alice and Bob are two separate connections racing to broadcast CHAT on
    // the same pin; Carol and Dave are pure observers. If a handler's
    // mutation and its broadcast ever split across the registry lock, the
    // two observers can end up seeing the interleaving in different orders.
    const ROUNDS: usize = 20;
    let send_alice = async {
        for i in 0..ROUNDS {
            alice
                .send(json!({"type": "CHAT", "pin": pin, "message": format!("a{i}")}))
                .await;
        }
    };
    let send_bob = async {
        for i in 0..ROUNDS {
            bob.send(json!({"type": "CHAT", "pin": pin, "message": format!("b{i}")}))
                .await;
        }
    };
    tokio::join!(send_alice, send_bob);

    let mut carol_order = Vec::with_capacity(ROUNDS * 2);
    let mut dave_order = Vec::with_capacity(ROUNDS * 2);
    for _ in 0..(ROUNDS * 2) {
        let frame = carol.recv_type("CHAT").await;
        carol_order.push(frame["message"].as_str().unwrap().to_string());
    }
    for _ in 0..(ROUNDS * 2) {
        let frame = dave.recv_type("CHAT").await;
        dave_order.push(frame["message"].as_str().unwrap().to_string());
    }

    assert_eq!(
        carol_order, dave_order,
        "two connections in the same game must observe the same relative ordering of broadcasts"
    );
}

#[tokio::test]
async fn end_game_is_idempotent() {
    let mut alice = TestClient::connect().await;

    alice.send(json!({"type": "REGISTER", "username": "Alice7"})).await;
    alice.recv_type("REGISTER_OK").await;

    alice.send(json!({"type": "CREATE_GAME", "theme": "Idempotent"})).await;
    let created = alice.recv_type("GAME_CREATED").await;
    let pin = created["game"]["pin"].as_str().unwrap().to_string();

    alice.send(json!({"type": "END_GAME", "pin": pin})).await;
    let first = alice.recv_type("GAME_ENDED").await;
    assert_eq!(first["game"]["state"], "ended");

    alice.send(json!({"type": "END_GAME", "pin": pin})).await;
    let second = tokio::time::timeout(std::time::Duration::from_millis(200), alice.recv()).await;
    assert!(
        second.is_err(),
        "a repeated END_GAME must not re-broadcast GAME_ENDED"
    );
}

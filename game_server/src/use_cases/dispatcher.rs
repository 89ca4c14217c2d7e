// The State Machine + Dispatcher: one decoded frame in, zero or more frames
// out (a reply to the sender, a broadcast to a pin, or both). Every handler
// that broadcasts goes through `registry.with_game_mut_and_broadcast`, which
// keeps the mutation and the broadcast under the same registry lock so two
// concurrent handlers on the same pin can never have their broadcasts arrive
// in an order that disagrees with the order their mutations were applied.

use crate::domain::{Game, Question, SCORE_PER_CORRECT_ANSWER};
use crate::interface_adapters::protocol::{
    field_bool_coerced, field_str, field_truthy, field_usize, message_type, GameDto, ServerMessage,
};
use crate::use_cases::connections::{ConnId, ConnectionTable};
use crate::use_cases::registry::GameRegistry;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

pub struct Dispatcher<'a> {
    pub registry: &'a GameRegistry,
    pub connections: &'a ConnectionTable,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a GameRegistry, connections: &'a ConnectionTable) -> Self {
        Self {
            registry,
            connections,
        }
    }

    /// Handles one decoded frame from `conn_id`. Never returns an error to
    /// the caller: every failure mode is expressed as an `ERROR` frame sent
    /// to the offending sender.
    pub async fn handle_message(&self, conn_id: ConnId, msg: Value) {
        let Some(msg_type) = message_type(&msg) else {
            self.reply(conn_id, ServerMessage::error("Unknown type: (missing)"))
                .await;
            return;
        };

        match msg_type {
            "REGISTER" => self.handle_register(conn_id, &msg).await,
            "LIST_GAMES" => self.handle_list_games(conn_id).await,
            "CREATE_GAME" => self.handle_create_game(conn_id, &msg).await,
            "JOIN_GAME" => self.handle_join_game(conn_id, &msg).await,
            "EXIT_GAME" => self.handle_exit_game(conn_id, &msg).await,
            "SUBMIT_QUESTION" => self.handle_submit_question(conn_id, &msg).await,
            "START_GAME" => self.handle_start_game(conn_id, &msg).await,
            "ANSWER" => self.handle_answer(conn_id, &msg).await,
            "NEXT_QUESTION" => self.handle_next_question(conn_id, &msg).await,
            "END_GAME" => self.handle_end_game(conn_id, &msg).await,
            "CHAT" => self.handle_chat(conn_id, &msg).await,
            other => {
                self.reply(conn_id, ServerMessage::error(format!("Unknown type: {other}")))
                    .await;
            }
        }
    }

    async fn reply(&self, conn_id: ConnId, msg: ServerMessage) {
        self.connections.send_to(conn_id, msg.to_value()).await;
    }

    /// Resolves the acting username: an in-band `username` field wins, then
    /// the connection's registered name.
    async fn resolve_username(&self, conn_id: ConnId, msg: &Value) -> Option<String> {
        if let Some(name) = field_str(msg, "username") {
            return Some(name.to_string());
        }
        self.connections.username(conn_id).await
    }

    async fn handle_register(&self, conn_id: ConnId, msg: &Value) {
        let Some(username) = field_str(msg, "username") else {
            self.reply(conn_id, ServerMessage::error("REGISTER requires username"))
                .await;
            return;
        };
        // Idempotent: re-registering the same (or a different) name on this
        // connection simply overwrites it and still replies REGISTER_OK.
        self.connections
            .set_username(conn_id, username.to_string())
            .await;
        self.reply(
            conn_id,
            ServerMessage::RegisterOk {
                username: username.to_string(),
            },
        )
        .await;
    }

    async fn handle_list_games(&self, conn_id: ConnId) {
        self.registry.sweep_ended(Instant::now()).await;
        let games = self
            .registry
            .list_public_lobbies()
            .await
            .iter()
            .map(GameDto::from)
            .collect();
        self.reply(conn_id, ServerMessage::GamesList { games }).await;
    }

    async fn handle_create_game(&self, conn_id: ConnId, msg: &Value) {
        if self.connections.username(conn_id).await.is_none() {
            self.reply(
                conn_id,
                ServerMessage::error("CREATE_GAME requires REGISTER first"),
            )
            .await;
            return;
        }
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(
                conn_id,
                ServerMessage::error("CREATE_GAME requires a registered connection"),
            )
            .await;
            return;
        };
        let theme = field_str(msg, "theme").unwrap_or("").to_string();
        let is_public = field_bool_coerced(msg, "isPublic");
        let max_players = field_usize(msg, "maxPlayers").unwrap_or(crate::domain::DEFAULT_MAX_PLAYERS);

        let pin = self.registry.allocate_pin().await;
        let game = Game::new(pin.clone(), username, theme, is_public, max_players);
        let dto = GameDto::from(&game);
        self.registry.put(game).await;
        self.connections.set_current_pin(conn_id, Some(pin)).await;

        self.reply(conn_id, ServerMessage::GameCreated { game: dto }).await;
    }

    async fn handle_join_game(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin").map(str::to_string) else {
            self.reply(conn_id, ServerMessage::error("JOIN_GAME requires pin"))
                .await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(conn_id, ServerMessage::error("JOIN_GAME requires a resolvable username"))
                .await;
            return;
        };

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.state != crate::domain::GameState::Lobby {
                        return Err("Game already started");
                    }
                    if game.is_full() {
                        return Err("Game is full");
                    }
                    game.add_player(&username);
                    Ok(GameDto::from(&*game))
                },
                |result| {
                    result.as_ref().ok().map(|dto| {
                        ServerMessage::PlayerJoined {
                            pin: pin.clone(),
                            game: dto.clone(),
                        }
                        .to_value()
                    })
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(dto)) => {
                self.connections
                    .set_current_pin(conn_id, Some(pin.clone()))
                    .await;
                self.reply(conn_id, ServerMessage::JoinedGame { game: dto }).await;
            }
        }
    }

    async fn handle_exit_game(&self, conn_id: ConnId, msg: &Value) {
        let pin = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await);
        let Some(pin) = pin else {
            self.reply(conn_id, ServerMessage::error("EXIT_GAME requires pin")).await;
            return;
        };
        let Some(username) = self.connections.username(conn_id).await else {
            self.reply(conn_id, ServerMessage::error("EXIT_GAME requires a registered connection"))
                .await;
            return;
        };

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    game.remove_player(&username);
                    if game.host == username {
                        game.promote_next_host();
                    }
                    if game.is_empty() {
                        None
                    } else {
                        Some(GameDto::from(&*game))
                    }
                },
                |result| {
                    result.as_ref().map(|dto| {
                        ServerMessage::PlayerLeft {
                            pin: pin.clone(),
                            game: dto.clone(),
                        }
                        .to_value()
                    })
                },
            )
            .await;

        self.connections.set_current_pin(conn_id, None).await;

        match outcome {
            Some(None) => {
                self.registry.remove(&pin).await;
            }
            Some(Some(_)) | None => {}
        }
    }

    async fn handle_submit_question(&self, conn_id: ConnId, msg: &Value) {
        if self.connections.username(conn_id).await.is_none() {
            self.reply(
                conn_id,
                ServerMessage::error("SUBMIT_QUESTION requires REGISTER first"),
            )
            .await;
            return;
        }
        let Some(pin) = field_str(msg, "pin").map(str::to_string) else {
            self.reply(conn_id, ServerMessage::error("SUBMIT_QUESTION requires pin"))
                .await;
            return;
        };
        let Some(question) = field_str(msg, "question").map(str::to_string) else {
            self.reply(conn_id, ServerMessage::error("SUBMIT_QUESTION requires question"))
                .await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(
                conn_id,
                ServerMessage::error("SUBMIT_QUESTION requires a resolvable username"),
            )
            .await;
            return;
        };
        let answer_true = field_truthy(msg, "answerTrue");

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.state != crate::domain::GameState::Lobby {
                        return Err("Can only submit questions before the game starts");
                    }
                    game.questions.push(Question {
                        author: username.clone(),
                        text: question.clone(),
                        answer_true,
                    });
                    Ok(())
                },
                |result| {
                    result.as_ref().ok().map(|_| {
                        ServerMessage::QuestionSubmitted {
                            pin: pin.clone(),
                            username: username.clone(),
                            question: question.clone(),
                            answer_true,
                        }
                        .to_value()
                    })
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(())) => {}
        }
    }

    async fn handle_start_game(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await)
        else {
            self.reply(conn_id, ServerMessage::error("START_GAME requires pin")).await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(conn_id, ServerMessage::error("START_GAME requires a resolvable username"))
                .await;
            return;
        };

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.host != username {
                        return Err("Only host can start");
                    }
                    if game.state != crate::domain::GameState::Lobby {
                        return Err("Game already started");
                    }
                    if game.questions.is_empty() {
                        return Err("Add at least 1 question before starting");
                    }
                    game.state = crate::domain::GameState::InProgress;
                    game.current_question_index = 0;
                    game.answered_by_index.clear();
                    Ok(GameDto::from(&*game))
                },
                |result| {
                    result.as_ref().ok().map(|dto| {
                        ServerMessage::GameStarted {
                            pin: pin.clone(),
                            game: dto.clone(),
                        }
                        .to_value()
                    })
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(_)) => {}
        }
    }

    async fn handle_answer(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await)
        else {
            self.reply(conn_id, ServerMessage::error("ANSWER requires pin")).await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(conn_id, ServerMessage::error("ANSWER requires a resolvable username"))
                .await;
            return;
        };
        let correct = field_bool_coerced(msg, "correct");

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.state != crate::domain::GameState::InProgress {
                        return Err("Game is not in progress");
                    }
                    game.add_player(&username);
                    let idx = game.current_question_index;
                    let already_answered = game
                        .answered_by_index
                        .get(&idx)
                        .is_some_and(|set| set.contains(&username));
                    if already_answered {
                        return Ok((GameDto::from(&*game), true));
                    }
                    game.answered_by_index
                        .entry(idx)
                        .or_default()
                        .insert(username.clone());
                    if correct {
                        *game.scores.entry(username.clone()).or_insert(0) += SCORE_PER_CORRECT_ANSWER;
                    }
                    Ok((GameDto::from(&*game), false))
                },
                |result| {
                    result.as_ref().ok().map(|(dto, duplicate)| {
                        ServerMessage::ScoreUpdate {
                            pin: pin.clone(),
                            game: dto.clone(),
                            answered_by: username.clone(),
                            correct,
                            duplicate: *duplicate,
                        }
                        .to_value()
                    })
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(_)) => {}
        }
    }

    async fn handle_next_question(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await)
        else {
            self.reply(conn_id, ServerMessage::error("NEXT_QUESTION requires pin"))
                .await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(
                conn_id,
                ServerMessage::error("NEXT_QUESTION requires a resolvable username"),
            )
            .await;
            return;
        };

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.host != username {
                        return Err("Only host can advance");
                    }
                    if game.state != crate::domain::GameState::InProgress {
                        return Err("Game is not in progress");
                    }
                    let next = game.current_question_index + 1;
                    if next >= game.questions.len() {
                        game.state = crate::domain::GameState::Ended;
                        game.ended_at = Some(Instant::now());
                        Ok((GameDto::from(&*game), true))
                    } else {
                        game.current_question_index = next;
                        Ok((GameDto::from(&*game), false))
                    }
                },
                |result| {
                    result.as_ref().ok().map(|(dto, ended)| {
                        if *ended {
                            ServerMessage::GameEnded {
                                pin: pin.clone(),
                                game: dto.clone(),
                            }
                            .to_value()
                        } else {
                            ServerMessage::NextQuestion {
                                pin: pin.clone(),
                                game: dto.clone(),
                            }
                            .to_value()
                        }
                    })
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(_)) => {}
        }
    }

    async fn handle_end_game(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await)
        else {
            self.reply(conn_id, ServerMessage::error("END_GAME requires pin")).await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(conn_id, ServerMessage::error("END_GAME requires a resolvable username"))
                .await;
            return;
        };

        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |game| {
                    if game.host != username {
                        return Err("Only host can end the game");
                    }
                    // Idempotent: already-ended games don't re-stamp endedAt
                    // and don't re-broadcast GAME_ENDED.
                    if game.state == crate::domain::GameState::Ended {
                        return Ok(None);
                    }
                    game.state = crate::domain::GameState::Ended;
                    game.ended_at = Some(Instant::now());
                    Ok(Some(GameDto::from(&*game)))
                },
                |result| match result {
                    Ok(Some(dto)) => Some(
                        ServerMessage::GameEnded {
                            pin: pin.clone(),
                            game: dto.clone(),
                        }
                        .to_value(),
                    ),
                    _ => None,
                },
            )
            .await;

        match outcome {
            None => {
                self.reply(conn_id, ServerMessage::error("Game not found")).await;
            }
            Some(Err(reason)) => {
                self.reply(conn_id, ServerMessage::error(reason)).await;
            }
            Some(Ok(_)) => {}
        }
    }

    async fn handle_chat(&self, conn_id: ConnId, msg: &Value) {
        let Some(pin) = field_str(msg, "pin")
            .map(str::to_string)
            .or(self.connections.current_pin(conn_id).await)
        else {
            self.reply(conn_id, ServerMessage::error("CHAT requires pin")).await;
            return;
        };
        let Some(message) = field_str(msg, "message").map(str::to_string) else {
            self.reply(conn_id, ServerMessage::error("CHAT requires message")).await;
            return;
        };
        let Some(username) = self.resolve_username(conn_id, msg).await else {
            self.reply(conn_id, ServerMessage::error("CHAT requires a resolvable username"))
                .await;
            return;
        };

        debug!(pin, from = %username, "chat broadcast");
        let outcome = self
            .registry
            .with_game_mut_and_broadcast(
                &pin,
                self.connections,
                |_game| (),
                |_| {
                    Some(
                        ServerMessage::Chat {
                            pin: pin.clone(),
                            from: username.clone(),
                            message: message.clone(),
                        }
                        .to_value(),
                    )
                },
            )
            .await;

        if outcome.is_none() {
            self.reply(conn_id, ServerMessage::error("Game not found")).await;
        }
    }
}

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use tracing::info;

use crate::engine::{Color, Move, PieceType, Position};
use crate::ws::{WsEvent, announce_move};

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        language: "rust".to_string(),
        engine: "chess-arena".to_string(),
        uptime,
    })
}

// =========================================================================
// Admin
// =========================================================================

/// DELETE /api/db
pub async fn clear_db(State(state): State<SharedState>) -> Json<EmptyResponse> {
    state.service.clear().await;
    Json(EmptyResponse {})
}

// =========================================================================
// Accounts and sessions
// =========================================================================

/// POST /api/user
pub async fn register(
    State(state): State<SharedState>,
    Json(input): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .service
        .register(&input.username, &input.password, &input.email)
        .await?;
    Ok(Json(LoginResponse {
        username: session.username,
        auth_token: session.auth_token,
    }))
}

/// POST /api/session
pub async fn login(
    State(state): State<SharedState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .service
        .login(&input.username, &input.password)
        .await?;
    Ok(Json(LoginResponse {
        username: session.username,
        auth_token: session.auth_token,
    }))
}

/// DELETE /api/session
pub async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<EmptyResponse>, ApiError> {
    state.service.logout(auth_token(&headers)?).await?;
    Ok(Json(EmptyResponse {}))
}

// =========================================================================
// Lobby
// =========================================================================

/// POST /api/games
pub async fn create_game(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), ApiError> {
    let game_id = state
        .service
        .create_game(auth_token(&headers)?, &input.game_name)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateGameResponse { game_id })))
}

/// GET /api/games
pub async fn list_games(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ListGamesResponse>, ApiError> {
    let games = state.service.list_games(auth_token(&headers)?).await?;
    Ok(Json(ListGamesResponse {
        games: games.into_iter().map(GameSummaryResponse::from).collect(),
    }))
}

/// PUT /api/games
pub async fn join_game(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<JoinGameRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let token = auth_token(&headers)?;
    let color = Color::from_str_loose(&input.player_color).ok_or_else(|| {
        ApiError::InvalidRequest(format!("invalid player color: {}", input.player_color))
    })?;
    state.service.join_game(token, input.game_id, color).await?;
    Ok(Json(EmptyResponse {}))
}

// =========================================================================
// Game queries
// =========================================================================

/// GET /api/games/:id
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
) -> Result<Json<GameResponse>, ApiError> {
    let record = state.service.get_game(id).await?;
    Ok(Json(game_to_response(&record)))
}

/// GET /api/games/:id/legal-moves?from=e2
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let from_str = query
        .from
        .ok_or_else(|| ApiError::InvalidRequest("missing 'from' square".into()))?;
    let from = Position::from_algebraic(&from_str)?;

    let found = state.service.legal_moves(id, from).await?;
    let diagram = found.moves.as_ref().map(|moves| {
        let perspective = found
            .board
            .get_piece(from)
            .map_or(Color::White, |p| p.color);
        let targets: Vec<Position> = moves.iter().map(|m| m.to).collect();
        found.board.render(perspective, &targets)
    });

    Ok(Json(LegalMovesResponse {
        from: from.to_algebraic(),
        moves: found
            .moves
            .map(|ms| ms.iter().map(legal_move_entry).collect()),
        diagram,
    }))
}

// =========================================================================
// Play
// =========================================================================

/// POST /api/games/:id/moves
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    headers: HeaderMap,
    Json(input): Json<MoveRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    let token = auth_token(&headers)?;
    let mv = resolve_move(&input)?;

    // Held until the move's events are queued for every client.
    let _order = state.ws.order_guard(id).await;
    let outcome = state.service.play_move(token, id, mv).await?;
    announce_move(&state.ws, &outcome, None).await;

    Ok(Json(game_to_response(&outcome.record)))
}

/// POST /api/games/:id/resign
pub async fn resign(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    headers: HeaderMap,
) -> Result<Json<EmptyResponse>, ApiError> {
    let token = auth_token(&headers)?;
    let _order = state.ws.order_guard(id).await;
    let username = state.service.resign(token, id).await?;
    info!(game_id = id, username = %username, "resigned over HTTP");

    let text = format!("{username} resigned. Game over!");
    state
        .ws
        .broadcast(id, WsEvent::notification(text))
        .await;

    Ok(Json(EmptyResponse {}))
}

// =========================================================================
// Helpers
// =========================================================================

/// Session token from the `authorization` header.
fn auth_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)
}

/// Build an engine move from the request's squares and optional promotion.
fn resolve_move(input: &MoveRequest) -> Result<Move, ApiError> {
    let from = Position::from_algebraic(&input.from)?;
    let to = Position::from_algebraic(&input.to)?;
    match input.promotion.as_deref() {
        None => Ok(Move::new(from, to)),
        Some(p) => {
            let kind = PieceType::from_promotion_str(p)
                .ok_or_else(|| ApiError::InvalidRequest(format!("invalid promotion: {p}")))?;
            Ok(Move::with_promotion(from, to, kind))
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

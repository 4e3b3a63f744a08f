//! Line-oriented terminal front end for the study flows.

use std::error::Error;
use std::io::Write;

use services::{
    AppServices, CountdownTimer, FlashcardSession, HttpStudyApi, QuizError, QuizSession,
    QuizStart, QuizTick, SessionError, StudyOutcome, StudyStart,
};
use study_core::TickOutcome;
use study_core::model::{CheckpointKey, DeckId, Judgment, QuizId, QuizResult};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin, stdin};

type AppResult = Result<(), Box<dyn Error>>;

fn input() -> Lines<BufReader<Stdin>> {
    BufReader::new(stdin()).lines()
}

fn prompt(text: &str) {
    print!("{text} > ");
    let _ = std::io::stdout().flush();
}

//
// ─── ACCOUNT ───────────────────────────────────────────────────────────────────
//

/// Log in and print shell exports for the issued tokens. Messages go to
/// stderr so the output can be passed to `eval`.
pub async fn login(api: &HttpStudyApi, username: &str, password: Option<String>) -> AppResult {
    let password = match password {
        Some(password) => password,
        None => {
            eprint!("Password for {username} > ");
            let _ = std::io::stderr().flush();
            input().next_line().await?.unwrap_or_default()
        }
    };

    let tokens = api.login(username, password.trim_end()).await?;
    let name = match api.profile().await {
        Ok(profile) => profile.display_name(),
        Err(_) => username.to_string(),
    };
    eprintln!("Logged in to {} as {name}.", api.config().base_url);
    println!("export STUDYBUDDY_ACCESS_TOKEN={}", tokens.access);
    if let Some(refresh) = tokens.refresh {
        println!("export STUDYBUDDY_REFRESH_TOKEN={refresh}");
    }
    Ok(())
}

pub async fn logout(api: &HttpStudyApi) -> AppResult {
    api.logout().await?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(api: &HttpStudyApi) -> AppResult {
    let profile = api.profile().await?;
    match &profile.email {
        Some(email) => println!("{} ({}) <{email}>", profile.display_name(), profile.username),
        None => println!("{} ({})", profile.display_name(), profile.username),
    }
    Ok(())
}

//
// ─── LISTINGS ──────────────────────────────────────────────────────────────────
//

/// Sessions and quiz attempts that can be resumed, most recent first.
pub async fn list_saved(app: &AppServices) -> AppResult {
    let keys = app.checkpoints().list().await?;
    if keys.is_empty() {
        println!("Nothing to resume.");
    }
    for key in keys {
        match key {
            CheckpointKey::Flashcards(deck_id) => {
                println!("deck {:>5}  studybuddy study --deck-id {deck_id}", deck_id.value());
            }
            CheckpointKey::Quiz(quiz_id) => {
                println!("quiz {:>5}  studybuddy quiz --quiz-id {quiz_id}", quiz_id.value());
            }
        }
    }
    Ok(())
}

pub async fn list_decks(app: &AppServices) -> AppResult {
    let decks = app.api().list_decks().await?;
    if decks.is_empty() {
        println!("No decks yet.");
    }
    for deck in decks {
        let mut line = format!("{:>5}  {}", deck.id().value(), deck.title());
        if let Some(count) = deck.card_count() {
            line.push_str(&format!("  ({count} cards)"));
        }
        if let Some(subject) = deck.subject() {
            line.push_str(&format!("  [{subject}]"));
        }
        if let Some(difficulty) = deck.difficulty() {
            line.push_str(&format!("  {difficulty}"));
        }
        println!("{line}");
    }
    Ok(())
}

pub async fn list_quizzes(app: &AppServices) -> AppResult {
    let quizzes = app.api().list_quizzes().await?;
    if quizzes.is_empty() {
        println!("No quizzes yet.");
    }
    for quiz in quizzes {
        let mut line = format!("{:>5}  {}", quiz.id.value(), quiz.title);
        if let Some(count) = quiz.question_count {
            line.push_str(&format!("  ({count} questions)"));
        }
        if let Some(limit) = quiz.time_limit_secs {
            line.push_str(&format!("  {}", study_core::format_clock(limit)));
        }
        println!("{line}");
    }
    Ok(())
}

//
// ─── FLASHCARDS ────────────────────────────────────────────────────────────────
//

fn render_card(session: &FlashcardSession) {
    let Some(card) = session.current_card() else {
        return;
    };
    let progress = session.progress();
    let stats = session.stats();
    println!();
    println!(
        "{}  ({:.0}%)  correct {} / incorrect {}",
        progress.label("Card"),
        progress.fraction() * 100.0,
        stats.correct,
        stats.incorrect
    );
    println!("  Q: {}", card.front());
    if session.is_revealed() {
        println!("  A: {}", card.back());
        if let Some(hint) = card.hint() {
            println!("  Hint: {hint}");
        }
        prompt("[c]orrect [i]ncorrect [r] hide [p]rev [n]ext [q]uit");
    } else {
        prompt("[r]eveal [p]rev [n]ext [q]uit");
    }
}

pub async fn study(app: &AppServices, deck_id: DeckId) -> AppResult {
    let service = app.flashcards();
    let mut session = match service.open(deck_id).await? {
        StudyStart::Empty => {
            println!("No cards found. This deck doesn't have any flashcards yet.");
            return Ok(());
        }
        StudyStart::Ready { session, resumed } => {
            if resumed {
                println!("Resuming your previous session.");
            }
            session
        }
    };

    let mut lines = input();
    loop {
        render_card(&session);
        let Some(line) = lines.next_line().await? else {
            service.suspend(&session).await;
            return Ok(());
        };
        let outcome = match line.trim() {
            "" | "r" | "reveal" => {
                if let Err(err) = session.reveal() {
                    println!("{err}");
                }
                continue;
            }
            "p" | "prev" => {
                service.previous(&mut session).await?;
                continue;
            }
            "c" | "correct" => service.judge(&mut session, Judgment::Correct).await,
            "i" | "incorrect" => service.judge(&mut session, Judgment::Incorrect).await,
            "n" | "next" => service.next(&mut session).await,
            "q" | "quit" => {
                service.suspend(&session).await;
                println!("Progress saved.");
                return Ok(());
            }
            other => {
                println!("unknown command: {other}");
                continue;
            }
        };
        match outcome {
            Ok(StudyOutcome::Continue { .. }) => {}
            Ok(StudyOutcome::Complete(done)) => {
                println!();
                println!("{}", done.message);
                return Ok(());
            }
            Err(SessionError::NotRevealed) => println!("Reveal the answer first."),
            Err(err) => return Err(err.into()),
        }
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

fn render_question(session: &QuizSession) {
    let question = session.current_question();
    let selected = session.answer_for(question.id());
    println!();
    println!(
        "{}  answered {}  time {}",
        session.progress().label("Question"),
        session.answered_count(),
        session.clock_label()
    );
    println!("  {}", question.text());
    for (i, choice) in question.choices().iter().enumerate() {
        let marker = if selected == Some(choice.id) { '*' } else { ' ' };
        println!("  {marker}{}. {}", i + 1, choice.text);
    }
    prompt("[1-9] answer [p]rev [n]ext [s]ubmit [q]uit");
}

fn render_results(result: &QuizResult) {
    println!();
    println!("Quiz complete!");
    println!("  Score:     {:.1}%", result.score);
    println!("  Correct:   {}", result.correct_answers);
    println!("  Incorrect: {}", result.incorrect_answers());
    prompt("[r]etake [q]uit");
}

async fn next_tick(timer: &mut Option<CountdownTimer>) -> Option<TickOutcome> {
    match timer {
        Some(timer) => timer.recv().await,
        None => std::future::pending().await,
    }
}

pub async fn take_quiz(app: &AppServices, quiz_id: QuizId) -> AppResult {
    let service = app.quizzes();
    let mut session = match service.open(quiz_id).await? {
        QuizStart::Empty => {
            println!("No questions found. This quiz doesn't have any questions yet.");
            return Ok(());
        }
        QuizStart::Ready { session, resumed } => {
            if resumed {
                println!("Resuming your previous attempt.");
            }
            session
        }
    };

    let mut lines = input();
    let mut timer = Some(service.start_timer(&session));
    render_question(&session);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    service.close(session, |_| {}).await;
                    return Ok(());
                };
                let command = line.trim();

                if let Some(result) = session.result().cloned() {
                    match command {
                        "r" | "retake" => {
                            service.retake(&mut session);
                            timer = Some(service.start_timer(&session));
                            render_question(&session);
                        }
                        "q" | "quit" => {
                            service
                                .close(session, |r| println!("Final score: {:.1}%", r.score))
                                .await;
                            return Ok(());
                        }
                        _ => render_results(&result),
                    }
                    continue;
                }

                match command {
                    "n" | "next" => {
                        service.next(&mut session).await?;
                    }
                    "p" | "prev" => {
                        service.previous(&mut session).await?;
                    }
                    "s" | "submit" => match service.submit(&mut session).await {
                        Ok(result) => {
                            timer = None;
                            render_results(&result);
                            continue;
                        }
                        Err(QuizError::Submit(err)) => println!("Failed to submit quiz: {err}"),
                        Err(err) => return Err(err.into()),
                    },
                    "q" | "quit" => {
                        service.close(session, |_| {}).await;
                        println!("Progress saved.");
                        return Ok(());
                    }
                    other => match other.parse::<usize>() {
                        Ok(n) if n > 0 => {
                            if let Err(err) = service.select_at(&mut session, n - 1).await {
                                println!("{err}");
                            }
                        }
                        _ => println!("unknown command: {other}"),
                    },
                }
                render_question(&session);
            }
            tick = next_tick(&mut timer) => {
                if tick.is_none() {
                    timer = None;
                    continue;
                }
                match service.on_tick(&mut session).await {
                    Ok(QuizTick::Running { remaining }) => {
                        if remaining % 60 == 0 || remaining == 10 {
                            println!();
                            println!("Time left: {}", session.clock_label());
                        }
                    }
                    Ok(QuizTick::Submitted(result)) => {
                        timer = None;
                        println!();
                        println!("Time's up!");
                        render_results(&result);
                    }
                    Ok(QuizTick::Stopped) => {}
                    Err(err) => println!("Failed to submit quiz: {err}"),
                }
            }
        }
    }
}

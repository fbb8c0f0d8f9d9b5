mod logging;
mod models;
mod scenario;
mod scheduler;
mod simulation;
mod world;

use clap::{Arg, Command};
use logging::{LogConfig, LogOutput, init_logging, parse_log_level};
use models::common::{Team, Vec2};
use models::intercept::predict_intercept_point;
use models::ship::{Ship, ShipAiParams};
use models::turret::Turret;
use scenario::ScenarioConfig;
use simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("shipsim")
        .version("0.1.0")
        .about("艦隊戦シミュレーション (Autonomous Ship Combat Simulation)")
        .long_about(
            "自律戦闘AIを搭載した艦のエージェントベースシミュレーション\n\
             固定時間刻みで操舵・戦術・照準の意思決定を毎ティック再現します。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help(
                    "実行するシナリオファイル(.yaml)のパスを指定します。\n\
                     指定しない場合、利用方法とシナリオ一覧を表示します。",
                ),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
                .conflicts_with("test"),
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .action(clap::ArgAction::SetTrue)
                .help("エージェントモデルのテストを実行")
                .conflicts_with("info"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("DEST")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)"),
        )
        .get_matches();

    println!("艦隊戦シミュレーション (Ship Combat Simulation) - shipsim v0.1.0");
    println!();

    // ログシステムの初期化
    let log_output = match matches
        .get_one::<String>("log")
        .map(String::as_str)
        .unwrap_or("console")
        .parse::<LogOutput>()
    {
        Ok(output) => output,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    let log_level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");

    let log_config = LogConfig {
        level: parse_log_level(log_level),
        output: log_output,
        ..LogConfig::default()
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("ログ初期化エラー: {}", e);
        std::process::exit(1);
    }

    // 詳細レベルの設定
    let verbose_level = matches.get_count("verbose");
    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    // テストモードの実行
    if matches.get_flag("test") {
        println!("=== エージェントモデルテストモード ===");
        test_agent_models();
        return;
    }

    // シナリオファイルの処理
    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // デフォルト動作: 利用方法とシナリオ一覧を表示
        show_default_help();
    }
}

fn test_agent_models() {
    println!("\n=== エージェントモデルのテスト ===");

    // 艦の作成
    let turrets = vec![
        Turret::new(0, 0.0, 45.0, 45.0, true, 90.0, 600.0, 1.2),
        Turret::new(1, 180.0, 45.0, 45.0, true, 90.0, 600.0, 1.2),
    ];
    let ship = Ship::new(
        "B01".to_string(),
        Team::Blue,
        Vec2::new(-300.0, 0.0),
        0.0,
        12.0,
        40.0,
        ShipAiParams::default(),
        turrets,
    );
    println!(
        "艦が作成されました: {} (砲塔{}基, 交戦様式: {:?})",
        ship.id,
        ship.turrets.len(),
        ship.tactic_state().battle_mode
    );

    // 迎撃予測のテスト
    let aim_point = predict_intercept_point(
        Vec2::new(-300.0, 0.0),
        Vec2::new(300.0, 0.0),
        Vec2::new(0.0, 30.0),
        600.0,
    );
    println!(
        "迎撃予測点が計算されました: ({:.1}, {:.1})",
        aim_point.x, aim_point.y
    );

    println!("\n全てのエージェントモデルが正常に作成されました！");
}

/// シナリオファイルを読み込んで実行
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    // シナリオファイルの読み込み
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    // 情報表示のみの場合
    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    // シナリオ実行
    execute_scenario(scenario, verbose_level)?;

    Ok(())
}

/// シナリオの実行
fn execute_scenario(
    scenario: ScenarioConfig,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    // 基本情報表示
    scenario.print_summary();
    println!();

    // シミュレーションエンジンの作成と初期化
    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;

    // シミュレーション実行
    simulation.run()?;

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  shipsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>  シナリオファイルを指定して実行");
    println!("  -i, --info             シナリオ情報のみ表示");
    println!("  -t, --test             エージェントモデルのテスト実行");
    println!("  -v, --verbose          詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log <DEST>       ログ出力先 (console, file, both)");
    println!("      --log-level <LV>   ログレベル (trace〜error)");
    println!("  -h, --help             このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/skirmish_basic.yaml    - 1対1の基本交戦");
    println!("  scenarios/fleet_engagement.yaml  - 随伴・障害物ありの艦隊戦");
    println!("  scenarios/patrol_idle.yaml       - 敵なし（徘徊・随伴確認用）");
    println!();
    println!("例:");
    println!("  shipsim -s scenarios/skirmish_basic.yaml");
    println!("  shipsim -s scenarios/fleet_engagement.yaml -v");
    println!("  shipsim -s scenarios/skirmish_basic.yaml -i");
    println!("  shipsim --test");
}

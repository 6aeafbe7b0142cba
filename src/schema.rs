diesel::table! {
    dim_player (player_id) {
        player_id -> Int8,
        player_name -> Nullable<Text>,
        nickname -> Nullable<Text>,
        age -> Nullable<Float8>,
    }
}

diesel::table! {
    dim_team (team_id) {
        team_id -> Int8,
        team_abbreviation -> Nullable<Text>,
    }
}

diesel::table! {
    fact_player_stats (stat_id) {
        stat_id -> Int8,
        player_id -> Int8,
        team_id -> Int8,
        gp -> Float8,
        w -> Float8,
        l -> Float8,
        w_pct -> Float8,
        min -> Float8,
        fgm -> Float8,
        fga -> Float8,
        fg_pct -> Float8,
        fg3m -> Float8,
        fg3a -> Float8,
        fg3_pct -> Float8,
        ftm -> Float8,
        fta -> Float8,
        ft_pct -> Float8,
        oreb -> Float8,
        dreb -> Float8,
        reb -> Float8,
        ast -> Float8,
        tov -> Float8,
        stl -> Float8,
        blk -> Float8,
        blka -> Float8,
        pf -> Float8,
        pfd -> Float8,
        pts -> Float8,
        plus_minus -> Float8,
        dd2 -> Float8,
        td3 -> Float8,
        nba_fantasy_pts -> Float8,
    }
}

diesel::joinable!(fact_player_stats -> dim_player (player_id));
diesel::joinable!(fact_player_stats -> dim_team (team_id));

diesel::allow_tables_to_appear_in_same_query!(dim_player, dim_team, fact_player_stats,);
